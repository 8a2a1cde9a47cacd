//! Core library for sprintdesk.
//!
//! Holds everything that does not need a terminal: the REST client, data
//! models, the session credential with its store and refresh logic, the
//! route table with its guard, and the screens as plain view models.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod router;
pub mod screens;
pub mod utils;
pub mod view;

//! REST API client module for the project-management backend.
//!
//! `AuthApi` and `ProjectApi` are the seams the session and the screens call
//! through; `ApiClient` is their HTTP implementation. Every protected call
//! takes the bearer token explicitly so the session decides which token is
//! sent.

pub mod client;
pub mod error;
pub mod service;

pub use client::ApiClient;
pub use error::ApiError;
pub use service::{AuthApi, ProjectApi};

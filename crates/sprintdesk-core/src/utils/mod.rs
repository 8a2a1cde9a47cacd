//! Utility functions for string formatting.

pub mod format;

pub use format::{ellipsize, format_minutes, truncate_string};

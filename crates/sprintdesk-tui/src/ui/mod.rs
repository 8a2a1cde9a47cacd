//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout and widgets for a `ScreenView`
//! - `input`: crossterm key events to backend-neutral `Input`
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;

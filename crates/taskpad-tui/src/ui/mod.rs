//! Terminal UI module using ratatui.
//!
//! - `render`: screens, overlays and toasts
//! - `input`: keyboard handling per screen and overlay
//! - `styles`: color palette and text styling

pub mod input;
pub mod render;
pub mod styles;

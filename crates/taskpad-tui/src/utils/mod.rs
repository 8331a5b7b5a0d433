//! Utility functions for string and time formatting.

pub mod format;

pub use format::{age_display, truncate_string};

//! Core library for taskpad.
//!
//! - `auth`: the session store, its persistence and the token codec
//! - `api`: the HTTP client for the auth and todo endpoints
//! - `feedback`: toasts and navigation requested from the front end
//! - `config`: user configuration and directory layout
//! - `models`: request and response bodies
//!
//! Typical wiring, done once at startup:
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskpad_core::{ApiClient, ChannelFeedback, Config, SessionStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let session = Arc::new(SessionStore::new(config.open_storage()?));
//! let (feedback, _ui_events) = ChannelFeedback::new();
//! let api = ApiClient::new(
//!     &config.api_base_url(),
//!     config.request_timeout(),
//!     session,
//!     Arc::new(feedback),
//! )?;
//! # let _ = api;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod feedback;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{KeyValueStore, SessionStore, TokenVerifier};
pub use config::{Config, StorageBackend};
pub use feedback::{ChannelFeedback, Dismissal, Feedback, Route, Toast, ToastLevel, UiEvent};
pub use models::{TodoItem, TokenStatus};

//! Session management and credential persistence.
//!
//! This module provides:
//! - `SessionStore`: the current bearer token, published to subscribers and
//!   persisted between runs
//! - `KeyValueStore`: durable storage backends (`FileStore`, `KeyringStore`,
//!   `MemoryStore`)
//! - `codec`: the reversible encoding applied to the stored token
//!
//! A restored token is only trusted after the backend confirms it.

pub mod codec;
pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{SessionStore, TokenVerifier, CREDENTIAL_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

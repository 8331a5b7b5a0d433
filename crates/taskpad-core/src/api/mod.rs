//! REST API client module for the to-do backend.
//!
//! This module provides the `ApiClient` for the auth endpoints
//! (login, register, token verification) and the todo CRUD endpoints.
//!
//! Authorized calls carry the session's bearer token, read from the
//! `SessionStore` at the moment each request is built.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

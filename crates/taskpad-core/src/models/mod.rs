//! Data models for the to-do API.
//!
//! - `TodoItem`: a to-do entry as the backend returns it
//! - Request/response bodies for the auth and todo endpoints

pub mod auth;
pub mod todo;

pub use auth::{Credentials, LoginResponse, TokenStatus, VerifyTokenRequest};
pub use todo::{
    next_status, DeleteResponse, NewTodo, StatusUpdate, TodoItem, STATUS_DONE,
    STATUS_IN_PROGRESS, STATUS_OPEN,
};

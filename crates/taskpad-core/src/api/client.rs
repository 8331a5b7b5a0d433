//! API client for communicating with the to-do REST API.
//!
//! This module provides the `ApiClient` struct for the auth endpoints and the
//! authenticated todo endpoints. Login, register and logout handle their own
//! failures and report them as toasts; every other call hands its error back
//! to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::{SessionStore, TokenVerifier};
use crate::feedback::{Feedback, Route, Toast};
use crate::models::{
    Credentials, DeleteResponse, LoginResponse, NewTodo, StatusUpdate, TodoItem, TokenStatus,
    VerifyTokenRequest,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Login success notice, short so the redirect follows quickly
const LOGIN_SUCCESS_TOAST_MS: u64 = 700;

const LOGIN_FAILURE_TOAST_MS: u64 = 1000;

const REGISTER_FAILURE_TOAST_MS: u64 = 1000;

const LOGOUT_TOAST_MS: u64 = 500;

const STATUS_UPDATED_TOAST_MS: u64 = 1000;

const TODO_DELETED_TOAST_MS: u64 = 5000;

/// API client for the to-do backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    feedback: Arc<dyn Feedback>,
}

impl ApiClient {
    /// Create a new API client. Without a timeout a request waits for the
    /// transport to settle.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        session: Arc<SessionStore>,
        feedback: Arc<dyn Feedback>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            feedback,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header from the credential as it is right now.
    /// An empty credential still produces `Bearer ` and the server decides.
    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let token = self.session.current_credential();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request once and parse the JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", what, e)))
    }

    // ===== Authentication =====

    /// Log in and store the returned token.
    ///
    /// On success the token is live as soon as this returns, a success toast
    /// is shown and, once it is dismissed, the user is sent home. Failures
    /// leave the credential alone and show an error toast. Returns whether
    /// the login took effect.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let request = self
            .client
            .post(self.url("/auth/login"))
            .json(&Credentials { username, password });

        match self.send_json::<LoginResponse>(request, "login response").await {
            Ok(LoginResponse { token }) if !token.is_empty() => {
                self.session.set_credential(token);
                info!(username = username, "Login successful");
                self.feedback
                    .toast(Toast::success(
                        "Signed in, redirecting...",
                        Duration::from_millis(LOGIN_SUCCESS_TOAST_MS),
                    ))
                    .wait()
                    .await;
                self.feedback.navigate(Route::Home);
                true
            }
            Ok(_) => {
                warn!("Login response carried no token");
                false
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.feedback.toast(Toast::error(
                    "Authentication failed, please try again",
                    Duration::from_millis(LOGIN_FAILURE_TOAST_MS),
                ));
                false
            }
        }
    }

    /// Create an account. Returns the server's response body, or `None`
    /// after showing the server's error message.
    pub async fn register(&self, username: &str, password: &str) -> Option<Value> {
        match self.post_register(username, password).await {
            Ok(body) => {
                info!(username = username, "Registration successful");
                Some(body)
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                self.feedback.toast(Toast::error(
                    e.user_message(),
                    Duration::from_millis(REGISTER_FAILURE_TOAST_MS),
                ));
                None
            }
        }
    }

    async fn post_register(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(&Credentials { username, password })
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("register response: {}", e)))
    }

    /// Ask the server whether `token` is still good. Uses the token given,
    /// not the session's.
    pub async fn verify_token(&self, token: &str) -> Result<TokenStatus, ApiError> {
        let request = self
            .client
            .post(self.url("/auth/verifyToken"))
            .json(&VerifyTokenRequest { token });
        self.send_json(request, "token verification").await
    }

    /// Forget the session, then send the user to the login screen once the
    /// notice has been dismissed.
    pub async fn logout(&self) {
        self.session.clear_credential();
        info!("Logged out");
        self.feedback
            .toast(Toast::success("Signed out", Duration::from_millis(LOGOUT_TOAST_MS)))
            .wait()
            .await;
        self.feedback.navigate(Route::Login);
    }

    /// Restore the persisted session, verifying it against this server
    pub async fn restore_session(&self) {
        self.session.initialize(self, self.feedback.as_ref()).await;
    }

    // ===== Todos =====

    pub async fn list_todos(&self) -> Result<Vec<TodoItem>, ApiError> {
        let request = self
            .client
            .get(self.url("/todo"))
            .headers(self.auth_headers()?);
        let todos: Vec<TodoItem> = self.send_json(request, "todo list").await?;
        debug!(count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    pub async fn create_todo(&self, title: &str, description: &str) -> Result<TodoItem, ApiError> {
        let request = self
            .client
            .post(self.url("/todo"))
            .headers(self.auth_headers()?)
            .json(&NewTodo { title, description });
        let todo: TodoItem = self.send_json(request, "created todo").await?;
        debug!(id = todo.id, "Created todo");
        Ok(todo)
    }

    pub async fn update_status(&self, status: &str, id: i64) -> Result<TodoItem, ApiError> {
        let request = self
            .client
            .patch(self.url(&format!("/todo/{}", id)))
            .headers(self.auth_headers()?)
            .json(&StatusUpdate { status });
        let todo: TodoItem = self.send_json(request, "updated todo").await?;
        self.feedback.toast(Toast::success(
            "Status updated",
            Duration::from_millis(STATUS_UPDATED_TOAST_MS),
        ));
        Ok(todo)
    }

    /// Delete a todo. `Ok(false)` means the server answered 2xx without
    /// confirming the delete; only a confirmed delete gets a toast.
    pub async fn delete_todo(&self, id: i64) -> Result<bool, ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/todo/{}", id)))
            .headers(self.auth_headers()?)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;

        let parsed: DeleteResponse = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(id = id, error = %e, "Unrecognised delete response");
            DeleteResponse::default()
        });

        if parsed.success {
            debug!(id = id, "Deleted todo");
            self.feedback.toast(Toast::success(
                "Todo deleted",
                Duration::from_millis(TODO_DELETED_TOAST_MS),
            ));
        }
        Ok(parsed.success)
    }
}

impl TokenVerifier for ApiClient {
    fn verify(&self, token: &str) -> impl Future<Output = Result<TokenStatus, ApiError>> + Send {
        self.verify_token(token)
    }
}

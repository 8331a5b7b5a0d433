use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential cannot be sent as a header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `message` field out of a JSON error body.
    /// Validation errors send a list of messages, which are joined.
    fn backend_message(body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        match value.get("message")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::backend_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                Self::truncate_body(body)
            }
        });
        match status.as_u16() {
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            code => ApiError::Rejected { status: code, message },
        }
    }

    /// Text suitable for a toast: the backend's own message when it sent one
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::AccessDenied(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServerError(msg)
            | ApiError::Rejected { message: msg, .. } => msg.clone(),
            ApiError::NetworkError(_) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_codes() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, ""),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, ""),
            ApiError::Rejected { status: 409, .. }
        ));
    }

    #[test]
    fn test_backend_message_is_extracted() {
        let err = ApiError::from_status(
            StatusCode::CONFLICT,
            r#"{"statusCode":409,"message":"Username already exists"}"#,
        );
        assert_eq!(err.user_message(), "Username already exists");
    }

    #[test]
    fn test_backend_message_list_is_joined() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":["password too short","username must be an email"]}"#,
        );
        assert_eq!(
            err.user_message(),
            "password too short; username must be an email"
        );
    }

    #[test]
    fn test_plain_body_falls_back_to_text() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.user_message(), "boom");
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.user_message(), "Unauthorized");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, &body);
        let msg = err.user_message();
        assert!(msg.contains("truncated, 800 total bytes"));
    }
}

use serde::{Deserialize, Serialize};

/// Body of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyTokenRequest<'a> {
    pub token: &'a str,
}

/// Result of `/auth/verifyToken`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatus {
    pub status: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_body() {
        let body = serde_json::to_value(Credentials {
            username: "alice",
            password: "secret",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"username": "alice", "password": "secret"}));
    }

    #[test]
    fn test_login_response_without_token() {
        let parsed: LoginResponse = serde_json::from_str(r#"{"user":"alice"}"#).unwrap();
        assert!(parsed.token.is_empty());
    }

    #[test]
    fn test_token_status() {
        let parsed: TokenStatus = serde_json::from_str(r#"{"status":true}"#).unwrap();
        assert!(parsed.status);
        assert!(serde_json::from_str::<TokenStatus>("{}").is_err());
    }
}

use axum::response::{IntoResponse, Response};
use common_http_errors::ApiError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Message returned to callers whenever a tenant token cannot be produced.
pub const TOKEN_UNAVAILABLE_MESSAGE: &str = "Failed to obtain Feishu tenant access token";

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Missing FEISHU_APP_ID or FEISHU_APP_SECRET")]
    MissingCredentials,
    #[error("Feishu auth request timed out")]
    Timeout,
    #[error("Feishu auth error: {0}")]
    Rejected(String),
    #[error("{0}")]
    Transport(String),
    #[error("Failed to obtain tenant_access_token: {0}")]
    MissingToken(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value.to_string())
        }
    }
}

// The underlying reason is logged by the caller, never sent to the client.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::service_unavailable(TOKEN_UNAVAILABLE_MESSAGE).into_response()
    }
}

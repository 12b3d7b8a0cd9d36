use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;

/// Wire shape shared by every error the gateway emits: `{"error": "..."}`.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    NotFound { message: String },
    MethodNotAllowed { message: String },
    Internal { message: String },
    BadGateway { message: String },
    ServiceUnavailable { message: String },
    GatewayTimeout { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self { Self::BadRequest { message: message.into() } }
    pub fn not_found() -> Self { Self::NotFound { message: "Not found".into() } }
    pub fn method_not_allowed() -> Self { Self::MethodNotAllowed { message: "Method not allowed".into() } }
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: e.to_string() } }
    pub fn bad_gateway(message: impl Into<String>) -> Self { Self::BadGateway { message: message.into() } }
    pub fn service_unavailable(message: impl Into<String>) -> Self { Self::ServiceUnavailable { message: message.into() } }
    pub fn gateway_timeout(message: impl Into<String>) -> Self { Self::GatewayTimeout { message: message.into() } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::NotFound { .. } => "not_found",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::Internal { .. } => "internal_error",
            ApiError::BadGateway { .. } => "bad_gateway",
            ApiError::ServiceUnavailable { .. } => "service_unavailable",
            ApiError::GatewayTimeout { .. } => "gateway_timeout",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message }
            | ApiError::NotFound { message }
            | ApiError::MethodNotAllowed { message }
            | ApiError::Internal { message }
            | ApiError::BadGateway { message }
            | ApiError::ServiceUnavailable { message }
            | ApiError::GatewayTimeout { message } => message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.status())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        if status.is_server_error() {
            tracing::debug!(status = status.as_u16(), code = error_code, message = self.message(), "gateway error response");
        }
        let body = ErrorBody { error: self.message().to_owned() };
        let mut resp = (status, Json(body)).into_response();
        resp.headers_mut().insert("X-Error-Code", HeaderValue::from_static(error_code));
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

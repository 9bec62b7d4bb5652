//! Request level error type.
//!
//! Every failure leaves the service as `{"error": "<message>"}` with a stable
//! message per condition. Internal details are logged and never returned.

use crate::models::Answer;
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

pub const MSG_INVALID_PAYLOAD: &str = "invalid request payload";
pub const MSG_INVALID_POLL_ID: &str = "invalid poll id";
pub const MSG_INVALID_POLL_OPTION: &str = "invalid poll option";
pub const MSG_INVALID_STATE: &str = "invalid state";
pub const MSG_POLL_NOT_FOUND: &str = "poll not found";
pub const MSG_VOTE_NOT_FOUND: &str = "vote not found";
pub const MSG_POLL_LIMIT: &str = "poll limit reached";
pub const MSG_RATE_LIMITED: &str = "Too many requests. Try again later.";
pub const MSG_TOKEN_EXCHANGE: &str = "failed to exchange code for oauth token";
pub const MSG_USER_INFO: &str = "failed to get user info";
pub const MSG_MISSING_IDENTITY: &str = "failed to retrieve user info";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred";

#[derive(Debug)]
pub enum ApiError {
    /// Malformed body, invalid enum value, bad path parameter.
    Validation(String),
    /// CSRF state mismatch.
    Auth(&'static str),
    NotFound(&'static str),
    /// Poll quota reached.
    LimitExceeded,
    RateLimited { retry_after_seconds: u64 },
    /// The provider refused the authorization code.
    TokenExchange(String),
    /// The provider accepted the code but the identity lookup failed.
    Identity(String),
    /// The session has no identity where one is required.
    MissingIdentity,
    /// Persistence, session or other unexpected failure. Detail is only logged.
    Internal(String),
}

impl ApiError {
    pub fn invalid_answer() -> Self {
        ApiError::Validation(format!(
            "invalid availability. needs to be one of: {}",
            Answer::allowed_values()
        ))
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        ApiError::Internal(e.to_string())
    }

    /// Message returned to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Auth(msg) | ApiError::NotFound(msg) => (*msg).to_owned(),
            ApiError::LimitExceeded => MSG_POLL_LIMIT.to_owned(),
            ApiError::RateLimited { .. } => MSG_RATE_LIMITED.to_owned(),
            ApiError::TokenExchange(_) => MSG_TOKEN_EXCHANGE.to_owned(),
            ApiError::Identity(_) => MSG_USER_INFO.to_owned(),
            ApiError::MissingIdentity => MSG_MISSING_IDENTITY.to_owned(),
            ApiError::Internal(_) => MSG_UNEXPECTED.to_owned(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::TokenExchange(detail) => write!(f, "{}: {}", MSG_TOKEN_EXCHANGE, detail),
            ApiError::Identity(detail) => write!(f, "{}: {}", MSG_USER_INFO, detail),
            ApiError::Internal(detail) => write!(f, "internal error: {}", detail),
            ApiError::RateLimited {
                retry_after_seconds,
            } => write!(f, "rate limited, retry after {}s", retry_after_seconds),
            other => f.write_str(&other.public_message()),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::TokenExchange(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LimitExceeded => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Identity(_) | ApiError::MissingIdentity | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }

        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited {
            retry_after_seconds,
        } = self
        {
            builder.insert_header((header::RETRY_AFTER, retry_after_seconds.to_string()));
        }
        builder.json(json!({ "error": self.public_message() }))
    }
}

impl From<crate::store::StoreError> for ApiError {
    fn from(e: crate::store::StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<actix_session::SessionGetError> for ApiError {
    fn from(e: actix_session::SessionGetError) -> Self {
        ApiError::Internal(format!("session read failed: {}", e))
    }
}

impl From<actix_session::SessionInsertError> for ApiError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        ApiError::Internal(format!("session write failed: {}", e))
    }
}

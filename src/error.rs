use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Every way a signup request can be turned away. The display string is the
/// message sent to the caller.
#[derive(Error, Debug)]
pub enum SignupError {
    #[error("Forbidden.")]
    Forbidden,

    #[error("Too many requests. Please try again later.")]
    TooManyRequests,

    #[error("Waitlist is not configured yet. Check back soon!")]
    NotConfigured,

    #[error("Invalid request.")]
    InvalidRequest,

    #[error("Email is required.")]
    EmailRequired,

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("Something went wrong. Try again.")]
    Internal,
}

impl SignupError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignupError::Forbidden => StatusCode::FORBIDDEN,
            SignupError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            SignupError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            SignupError::InvalidRequest
            | SignupError::EmailRequired
            | SignupError::InvalidEmail => StatusCode::BAD_REQUEST,
            SignupError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            SignupError::Forbidden => "forbidden",
            SignupError::TooManyRequests => "rate_limited",
            SignupError::NotConfigured => "not_configured",
            SignupError::InvalidRequest => "invalid_request",
            SignupError::EmailRequired => "email_required",
            SignupError::InvalidEmail => "invalid_email",
            SignupError::Internal => "internal",
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique violation on `email`.
    #[error("email is already on the waitlist")]
    Conflict,

    #[error("datastore responded {status}: {message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("datastore request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("datastore response carried no usable row count")]
    MalformedCount,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid site URL {value:?}: {reason}")]
    InvalidSiteUrl { value: String, reason: String },

    #[error("failed to build datastore client: {0}")]
    StoreClient(#[source] StoreError),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

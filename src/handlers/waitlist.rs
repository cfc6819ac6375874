use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{
        HeaderMap,
        header::{HOST, ORIGIN, REFERER},
    },
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::email::{fingerprint, is_valid, normalize};
use crate::error::{SignupError, StoreError};
use crate::metrics::{REJECTIONS, REQUEST_TOTAL, SIGNUPS, STORE_LATENCY};
use crate::models::{ALREADY_ON_THE_LIST, MessageResponse, ON_THE_LIST, WaitlistEntry};
use crate::origin::is_origin_allowed;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<MessageResponse>, SignupError> {
    REQUEST_TOTAL.inc();

    let result = signup(&state, &headers, body).await;
    if let Err(e) = &result {
        REJECTIONS.with_label_values(&[e.reason()]).inc();
    }

    result.map(Json)
}

// Stages run in order and stop at the first rejection. Nothing is written
// before the insert at the very end. A body that could not be read (too
// large, aborted) is only reported once the body is actually needed.
async fn signup(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<MessageResponse, SignupError> {
    if !is_origin_allowed(
        header(headers, ORIGIN.as_str()),
        header(headers, REFERER.as_str()),
        header(headers, HOST.as_str()),
        state.site_origin.as_deref(),
    ) {
        debug!(origin = ?header(headers, ORIGIN.as_str()), "signup rejected: origin not allowed");
        return Err(SignupError::Forbidden);
    }

    let client = client_identifier(headers);
    if state.rate_limiter.should_block(client) {
        debug!(client, "signup rejected: rate limited");
        return Err(SignupError::TooManyRequests);
    }

    let Some(store) = state.store.as_ref() else {
        return Err(SignupError::NotConfigured);
    };

    let body = body.map_err(|rejection| {
        debug!(status = %rejection.status(), "signup rejected: unreadable body");
        SignupError::InvalidRequest
    })?;
    let email = normalize(&requested_email(&body)?);
    if !is_valid(&email) {
        return Err(SignupError::InvalidEmail);
    }

    let entry = WaitlistEntry::new(email);
    let start_time = Instant::now();
    let outcome = store.insert(&entry).await;
    STORE_LATENCY.observe(start_time.elapsed().as_secs_f64());

    match outcome {
        Ok(()) => {
            SIGNUPS.with_label_values(&["created"]).inc();
            info!(email = %fingerprint(&entry.email), "new waitlist signup");
            Ok(MessageResponse::new(ON_THE_LIST))
        }
        Err(StoreError::Conflict) => {
            SIGNUPS.with_label_values(&["duplicate"]).inc();
            debug!(email = %fingerprint(&entry.email), "repeat waitlist signup");
            Ok(MessageResponse::new(ALREADY_ON_THE_LIST))
        }
        Err(e) => {
            error!(error = %e, email = %fingerprint(&entry.email), "waitlist insert failed");
            Err(SignupError::Internal)
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First hop of `X-Forwarded-For`, or `"unknown"`.
pub(crate) fn client_identifier(headers: &HeaderMap) -> &str {
    header(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
}

// Unparseable JSON or `null` is a malformed request; anything else without a
// non-empty string `email` is a missing email.
fn requested_email(body: &[u8]) -> Result<String, SignupError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| SignupError::InvalidRequest)?;
    if value.is_null() {
        return Err(SignupError::InvalidRequest);
    }

    value
        .get("email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .ok_or(SignupError::EmailRequired)
}

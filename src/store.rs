//! Persistence gateway for the `waitlist` table.
//!
//! The production backend is a Supabase project reached through its
//! PostgREST API. Uniqueness of `email` is enforced by the database, and a
//! violation surfaces as [`StoreError::Conflict`] so callers can treat it as
//! "already signed up".

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header::CONTENT_RANGE};
use serde::Deserialize;
use std::time::Duration;

use crate::error::StoreError;
use crate::models::WaitlistEntry;

pub const WAITLIST_TABLE: &str = "waitlist";

// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[async_trait]
pub trait WaitlistStore: Send + Sync {
    async fn insert(&self, entry: &WaitlistEntry) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

// Error body PostgREST sends on failed requests
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

pub struct SupabaseStore {
    client: reqwest::Client,
    table_url: String,
    service_key: String,
}

impl SupabaseStore {
    /// Every request made through the store is cut off after `timeout`.
    pub fn new(base_url: &str, service_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let table_url = format!(
            "{}/rest/v1/{}",
            base_url.trim_end_matches('/'),
            WAITLIST_TABLE
        );

        Ok(Self {
            client,
            table_url,
            service_key: service_key.to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

#[async_trait]
impl WaitlistStore for SupabaseStore {
    async fn insert(&self, entry: &WaitlistEntry) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(insert_error(status, &body))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let response = self
            .authorized(self.client.head(format!("{}?select=*", self.table_url)))
            .header("Prefer", "count=exact")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                code: None,
                message: "count request failed".to_string(),
            });
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .ok_or(StoreError::MalformedCount)
    }
}

fn insert_error(status: StatusCode, body: &str) -> StoreError {
    let error: PostgrestError = serde_json::from_str(body).unwrap_or_default();

    let conflict = match error.code.as_deref() {
        Some(code) => code == UNIQUE_VIOLATION,
        None => status == StatusCode::CONFLICT,
    };
    if conflict {
        return StoreError::Conflict;
    }

    StoreError::Status {
        status: status.as_u16(),
        code: error.code,
        message: error.message.unwrap_or_else(|| body.to_string()),
    }
}

// "0-24/3573" or "*/3573"; "*/*" means the count was not computed
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_code_is_conflict() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.co) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"waitlist_email_key\""}"#;
        assert!(matches!(
            insert_error(StatusCode::CONFLICT, body),
            StoreError::Conflict
        ));
    }

    #[test]
    fn bare_409_is_conflict() {
        assert!(matches!(
            insert_error(StatusCode::CONFLICT, ""),
            StoreError::Conflict
        ));
    }

    #[test]
    fn other_codes_are_not_conflicts() {
        let body = r#"{"code":"42501","message":"permission denied for table waitlist"}"#;
        match insert_error(StatusCode::FORBIDDEN, body) {
            StoreError::Status {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 403);
                assert_eq!(code.as_deref(), Some("42501"));
                assert_eq!(message, "permission denied for table waitlist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_as_message() {
        match insert_error(StatusCode::BAD_GATEWAY, "upstream down") {
            StoreError::Status { message, code, .. } => {
                assert_eq!(message, "upstream down");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn content_range_total_forms() {
        assert_eq!(content_range_total("*/3573"), Some(3573));
        assert_eq!(content_range_total("0-24/3573"), Some(3573));
        assert_eq!(content_range_total("*/0"), Some(0));
        assert_eq!(content_range_total("*/*"), None);
        assert_eq!(content_range_total("garbage"), None);
    }

    #[test]
    fn table_url_ignores_trailing_slash() {
        let store =
            SupabaseStore::new("https://abcd.supabase.co/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(store.table_url, "https://abcd.supabase.co/rest/v1/waitlist");
    }
}

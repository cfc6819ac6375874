use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ON_THE_LIST: &str = "You're on the list!";
pub const ALREADY_ON_THE_LIST: &str = "You're already on the list!";

// One row of the `waitlist` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub signed_up_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn new(email: String) -> Self {
        Self {
            email,
            signed_up_at: Utc::now(),
        }
    }
}

// Success body for POST /waitlist
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// Failure body for POST /waitlist
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Body for GET /waitlist/count
#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

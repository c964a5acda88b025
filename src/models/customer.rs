use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-customer record linking a stable identity (normalized phone number)
/// to the currently active conversational session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub phone_number: String,
    pub display_name: Option<String>,
    /// Active session id, or `None` when no conversation is in flight.
    pub session_id: Option<String>,
    /// Most recently ended session, kept for traceability.
    pub last_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(id: &str, phone_number: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            phone_number: phone_number.to_string(),
            display_name: None,
            session_id: None,
            last_session_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only business reference data supplied at session creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessContext {
    pub name: String,
    pub phone_number: String,
    /// IANA timezone name, e.g. `America/New_York`.
    pub timezone: String,
}

/// State the engine needs to make booking decisions. Everything else a
/// conversation accumulates lives in `history`, which the core treats as
/// opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub customer_id: String,
    pub phone_number: String,
    pub display_name: Option<String>,
    pub business: BusinessContext,
}

/// One conversational turn. Owned by the conversational layer; the core
/// only appends and persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub history: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial state merge applied by `SessionManager::update_state`.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub display_name: Option<String>,
}

use crate::services::clock::ClockError;

/// Failures surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Public error taxonomy of the engine.
///
/// Slot conflicts and malformed input tied to a single booking attempt are
/// usually reported back as structured outcomes instead (see
/// `services::booking`), so the conversational layer can phrase a reply.
/// These variants are what crosses the boundary when the operation itself
/// cannot proceed.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("the requested slot conflicts with an existing appointment")]
    SlotConflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("session corrupt: {0}")]
    SessionCorrupt(String),

    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl From<ClockError> for EngineError {
    fn from(e: ClockError) -> Self {
        EngineError::InvalidInput(e.to_string())
    }
}

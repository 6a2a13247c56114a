use thiserror::Error;

/// Engine-wide error taxonomy.
///
/// Ingestion failures are absorbed and logged at the index-store boundary;
/// every other variant propagates unchanged to the conversation session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ingestion failed: {0}")]
    Ingestion(String),
    #[error("no persisted index found: {0}")]
    IndexNotFound(String),
    #[error("persisted index is corrupt: {0}")]
    IndexCorrupt(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("empty input")]
    EmptyInput,
    #[error("model backend unavailable: {0}")]
    ModelUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        EngineError::Internal(err.to_string())
    }
}

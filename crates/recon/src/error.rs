use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Backing store missing, unreadable, or empty at load time.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),
    /// A declared property value could not be coerced to its canonical type.
    #[error("property '{key}': cannot coerce value '{value}'")]
    PropertyCoercion { key: String, value: String },
    /// Request payload failed parsing or validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Matching config failed to parse or validate.
    #[error("config error: {0}")]
    Config(String),
    /// A single query's processing failed inside a batch.
    #[error("query '{query_id}' failed: {message}")]
    QueryFailed { query_id: String, message: String },
}

impl ReconError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::RegistryUnavailable(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RegistryUnavailable(_))
    }
}

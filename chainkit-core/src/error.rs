//! Error types for chain operations.

/// The main error type for chain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Missing or ambiguous keys, or a call shape the chain cannot serve
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation the chain does not implement (e.g. streaming)
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Errors raised by a chain's execution hook
    #[error("Execution error: {0}")]
    Execution(String),

    /// Errors raised by the memory collaborator
    #[error("Memory error: {0}")]
    Memory(String),

    /// Deadline exceeded
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Stream errors
    #[error("Stream error: {0}")]
    Stream(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors from collaborators reporting through `anyhow`
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl ChainError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a memory error
    pub fn memory(msg: impl Into<String>) -> Self {
        Self::Memory(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Timeout(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ChainError::InvalidArgument(_))
    }

    /// Check if this is an unsupported operation error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ChainError::Unsupported(_))
    }
}

impl From<String> for ChainError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for ChainError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ChainError::timeout("deadline").is_retryable());
        assert!(!ChainError::execution("boom").is_retryable());
        assert!(!ChainError::invalid_argument("missing").is_retryable());
    }

    #[test]
    fn test_display_names_kind() {
        let err = ChainError::invalid_argument("Missing some input keys: [\"a\"]");
        assert_eq!(
            err.to_string(),
            "Invalid argument: Missing some input keys: [\"a\"]"
        );

        let err: ChainError = anyhow::anyhow!("store offline").into();
        assert_eq!(err.to_string(), "store offline");
    }
}

//! Errors raised while configuring or running an embedding backend

pub type Result<T> = std::result::Result<T, EmbedError>;

/// Failure of an embedding operation.
///
/// [`EmbedError::MissingCapability`] means the backend can never serve the
/// configured model in this process (unknown name, model that failed to
/// load); every other variant is a failure of one call or one setting.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("{capability} is unavailable: {hint}")]
    MissingCapability { capability: String, hint: String },

    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The model was loaded but failed to embed a batch
    #[error("Embedding generation failed: {reason}")]
    EmbeddingGeneration { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking model task panicked or was cancelled
    #[error("Embedding task failed: {0}")]
    AsyncTask(#[from] tokio::task::JoinError),

    /// Errors surfaced by the ONNX backend outside of a batch
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl EmbedError {
    /// `capability` names what is unavailable, `hint` what the operator can
    /// do about it
    pub fn missing_capability(capability: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingCapability {
            capability: capability.into(),
            hint: hint.into(),
        }
    }

    pub fn generation(reason: impl Into<String>) -> Self {
        Self::EmbeddingGeneration {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn is_missing_capability(&self) -> bool {
        matches!(self, Self::MissingCapability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_message_carries_hint() {
        let err = EmbedError::missing_capability(
            "embedding model 'foo'",
            "use one of: all-MiniLM-L6-v2",
        );
        assert!(err.is_missing_capability());
        assert_eq!(
            err.to_string(),
            "embedding model 'foo' is unavailable: use one of: all-MiniLM-L6-v2"
        );
        assert!(!EmbedError::invalid_config("x").is_missing_capability());
        assert!(!EmbedError::generation("lock poisoned").is_missing_capability());
    }
}

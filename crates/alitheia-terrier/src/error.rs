//! Error types for the Alitheia data-access layer.

use std::time::Duration;

/// Terrier errors.
///
/// Every variant except [`TerrierError::Config`] is a remote fault: the
/// framework could not be reached or rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerrierError {
    /// No session with the framework.
    #[error("not connected to the Alitheia framework: {reason}")]
    NotConnected { reason: String },

    /// Credentials rejected.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Resource not found on the framework.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Transport-level failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// The framework answered with an unexpected status.
    #[error("remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl TerrierError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network { .. } => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Whether the error originates from the remote side (or reaching it).
    pub fn is_remote_fault(&self) -> bool {
        !matches!(self, Self::Config { .. })
    }
}

impl From<reqwest::Error> for TerrierError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for Terrier operations.
pub type TerrierResult<T> = Result<T, TerrierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TerrierError::Network {
            message: "reset".into()
        }
        .is_retryable());
        assert!(TerrierError::RateLimited { retry_after: None }.is_retryable());
        assert!(TerrierError::Remote {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!TerrierError::Remote {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!TerrierError::Unauthorized {
            message: "nope".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_remote_fault_classification() {
        assert!(TerrierError::NotConnected {
            reason: "down".into()
        }
        .is_remote_fault());
        assert!(!TerrierError::Config {
            message: "bad url".into()
        }
        .is_remote_fault());
    }
}

//! Error types for plugin configuration sets.

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value exists but cannot be decoded into the requested shape.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The configuration source could not be parsed.
    #[error("failed to parse configuration: {message}")]
    Parse { message: String },

    /// The configuration source could not be read.
    #[error("failed to read configuration {path}: {message}")]
    Io { path: String, message: String },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

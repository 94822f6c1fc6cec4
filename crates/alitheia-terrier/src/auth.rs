//! Account credentials sent with every framework request.
//!
//! The framework authenticates each web-service call with HTTP basic auth.
//! A facade normally runs with the unprivileged account from its
//! configuration; logging a user in swaps nothing here, the session is kept
//! server side.

use crate::types::TerrierConfig;

/// Credentials provider for framework requests.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Basic auth with a user name and password.
    Basic { user: String, password: String },

    /// No authentication.
    None,
}

impl Credentials {
    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Unprivileged account from the configuration.
    ///
    /// An empty user name means anonymous access.
    pub fn from_config(config: &TerrierConfig) -> Self {
        if config.user.is_empty() {
            Self::None
        } else {
            Self::basic(&config.user, &config.password)
        }
    }

    /// Attach the credentials to a request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Basic { user, password } => request.basic_auth(user, Some(password)),
            Self::None => request,
        }
    }

    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Basic { user, .. } => Some(user),
            Self::None => None,
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

// Never print the password.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Self::None => write!(f, "None"),
        }
    }
}

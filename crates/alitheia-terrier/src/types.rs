//! Wire records exchanged with the Alitheia web services, and client configuration.

use alitheia_config::PluginConfig;
use serde::{Deserialize, Serialize};

/// A project stored in the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsStoredProject {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(default)]
    pub bugs: Option<String>,

    #[serde(default)]
    pub mail: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,
}

/// A recorded project version (one commit / revision).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsProjectVersion {
    pub id: i64,

    pub project_id: i64,

    /// Revision number inside the project (e.g. SVN revision).
    pub version: i64,

    /// Commit time, milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,

    #[serde(default)]
    pub committer_id: Option<i64>,

    #[serde(default)]
    pub commit_msg: Option<String>,
}

/// A directory in a project's source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsDirectory {
    pub id: i64,
    pub path: String,
}

/// A file as it exists in one project version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsProjectFile {
    pub id: i64,

    pub project_version_id: i64,

    #[serde(default)]
    pub directory_id: Option<i64>,

    pub file_name: String,

    /// Change status in this version ("ADDED", "MODIFIED", "DELETED", ...).
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub is_directory: bool,
}

/// An installed or evaluated metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsMetric {
    pub id: i64,

    pub metric_type_id: i64,

    pub mnemonic: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub plugin_id: Option<i64>,
}

/// Metric type id and its descriptive name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsMetricType {
    pub id: i64,

    #[serde(rename = "type")]
    pub type_name: String,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsUser {
    pub id: i64,
    pub user_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// File statistics of one project version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsVersionStats {
    pub version_id: i64,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub modified: u64,
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub total: u64,
}

/// One metric result for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsResultEntry {
    pub resource_id: i64,
    pub mnemonic: String,
    pub result: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Selects metrics by the kind of resource they evaluate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRequest {
    /// Ignore `resources_ids` and match every resource of the selected kinds.
    #[serde(default)]
    pub skip_resources_ids: bool,

    #[serde(default)]
    pub resources_ids: Vec<i64>,

    #[serde(default)]
    pub is_file_group: bool,

    #[serde(default)]
    pub is_project_file: bool,

    #[serde(default)]
    pub is_project_version: bool,

    #[serde(default)]
    pub is_stored_project: bool,
}

impl MetricsRequest {
    /// Every metric installed in the framework, for all resource kinds.
    pub fn all_installed() -> Self {
        Self {
            skip_resources_ids: true,
            resources_ids: Vec::new(),
            is_file_group: true,
            is_project_file: true,
            is_project_version: true,
            is_stored_project: true,
        }
    }
}

/// Selects metric results by resource and metric mnemonic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsResultRequest {
    pub resource_ids: Vec<i64>,
    pub mnemonics: Vec<String>,
    /// Resource kind the ids refer to (e.g. "ProjectFile", "ProjectVersion").
    pub data_type: String,
}

/// Configuration key: unprivileged account name.
pub const CFG_UNPRIV_USER: &str = "unpriv.user";
/// Configuration key: unprivileged account password.
pub const CFG_UNPRIV_PASS: &str = "unpriv.pass";
/// Configuration key: framework base URL.
pub const CFG_FRAMEWORK_URL: &str = "framework.url";
/// Configuration key: request timeout in seconds.
pub const CFG_FRAMEWORK_TIMEOUT: &str = "framework.timeout";
/// Configuration key: maximum retries for transient failures.
pub const CFG_FRAMEWORK_MAX_RETRIES: &str = "framework.max_retries";

/// Connection settings for the Alitheia framework.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrierConfig {
    /// Base URL of the framework's web services.
    #[serde(default = "default_url")]
    pub url: String,

    /// Unprivileged account used for anonymous browsing.
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl std::fmt::Debug for TerrierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrierConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn default_url() -> String {
    "http://localhost:8088/sqooss/ws".to_string()
}

fn default_user() -> String {
    "alitheia".to_string()
}

fn default_password() -> String {
    "alitheia".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for TerrierConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: default_user(),
            password: default_password(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl TerrierConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `ALITHEIA_FRAMEWORK_URL` | Framework base URL |
    /// | `ALITHEIA_UNPRIV_USER` | Unprivileged account name |
    /// | `ALITHEIA_UNPRIV_PASS` | Unprivileged account password |
    /// | `ALITHEIA_TIMEOUT` | Request timeout in seconds |
    /// | `ALITHEIA_MAX_RETRIES` | Max retries for transient failures |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("ALITHEIA_FRAMEWORK_URL").unwrap_or_else(|_| default_url()),
            user: std::env::var("ALITHEIA_UNPRIV_USER").unwrap_or_else(|_| default_user()),
            password: std::env::var("ALITHEIA_UNPRIV_PASS")
                .unwrap_or_else(|_| default_password()),
            timeout_secs: std::env::var("ALITHEIA_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("ALITHEIA_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
        }
    }

    /// Read settings from a configuration set.
    ///
    /// Missing or unparsable keys fall back to the defaults, so an empty set
    /// yields [`TerrierConfig::default`].
    pub fn from_plugin_config<C: PluginConfig + ?Sized>(config: &C) -> Self {
        let defaults = Self::default();
        Self {
            url: config
                .get_string(CFG_FRAMEWORK_URL)
                .map(String::from)
                .unwrap_or(defaults.url),
            user: config
                .get_string(CFG_UNPRIV_USER)
                .map(String::from)
                .unwrap_or(defaults.user),
            password: config
                .get_string(CFG_UNPRIV_PASS)
                .map(String::from)
                .unwrap_or(defaults.password),
            timeout_secs: config
                .get_string(CFG_FRAMEWORK_TIMEOUT)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_secs),
            max_retries: config
                .get_string(CFG_FRAMEWORK_MAX_RETRIES)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the unprivileged credentials.
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

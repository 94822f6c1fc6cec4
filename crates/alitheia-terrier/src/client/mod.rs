//! Web-service client for the Alitheia framework accessors.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::auth::Credentials;
use crate::error::{TerrierError, TerrierResult};
use crate::types::{
    MetricsRequest, MetricsResultRequest, TerrierConfig, WsDirectory, WsMetric, WsMetricType,
    WsProjectFile, WsProjectVersion, WsResultEntry, WsStoredProject, WsUser, WsVersionStats,
};

mod helpers;
mod http;

use helpers::{IdsBody, LoginBody, LogoutBody, NumbersBody, PendingUserBody};
use http::HttpBackend;

/// User agent sent with every request.
pub const TERRIER_USER_AGENT: &str = concat!("alitheia-terrier/", env!("CARGO_PKG_VERSION"));

/// Client for the project, metric and user accessors.
#[derive(Debug, Clone)]
pub struct AlitheiaClient {
    http: HttpBackend,
}

impl AlitheiaClient {
    pub fn new(config: &TerrierConfig) -> TerrierResult<Self> {
        Self::with_credentials(config, Credentials::from_config(config))
    }

    pub fn with_credentials(config: &TerrierConfig, credentials: Credentials) -> TerrierResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(TERRIER_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| TerrierError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http: HttpBackend {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
                credentials,
                max_retries: config.max_retries,
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.http.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.credentials.is_authenticated()
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Connectivity check.
    pub async fn ping(&self) -> TerrierResult<()> {
        let url = self.http.url("/ping");
        debug!(url = %url, "pinging framework");
        self.http.request::<()>(reqwest::Method::GET, &url, None).await?;
        Ok(())
    }

    /// Log a user in. Rejected credentials are `Ok(false)`, not an error.
    pub async fn login(&self, user: &str, password: &str) -> TerrierResult<bool> {
        let url = self.http.url("/session/login");
        debug!(url = %url, user, "logging in");
        match self
            .http
            .post_unit(&url, &LoginBody { user, password })
            .await
        {
            Ok(()) => Ok(true),
            Err(TerrierError::Unauthorized { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn logout(&self, user: &str) -> TerrierResult<()> {
        let url = self.http.url("/session/logout");
        debug!(url = %url, user, "logging out");
        self.http.post_unit(&url, &LogoutBody { user }).await
    }

    // ---------------------------------------------------------------------
    // Project accessor
    // ---------------------------------------------------------------------

    pub async fn get_projects_by_ids(&self, ids: &[i64]) -> TerrierResult<Vec<WsStoredProject>> {
        let url = self.http.url("/projects/by-ids");
        debug!(url = %url, count = ids.len(), "fetching projects by id");
        self.http.post_json(&url, &IdsBody { ids }).await
    }

    pub async fn get_evaluated_projects(&self) -> TerrierResult<Vec<WsStoredProject>> {
        let url = self.http.url("/projects/evaluated");
        debug!(url = %url, "fetching evaluated projects");
        self.http.get_json(&url).await
    }

    pub async fn get_project_versions_by_ids(
        &self,
        ids: &[i64],
    ) -> TerrierResult<Vec<WsProjectVersion>> {
        let url = self.http.url("/versions/by-ids");
        debug!(url = %url, count = ids.len(), "fetching versions by id");
        self.http.post_json(&url, &IdsBody { ids }).await
    }

    pub async fn get_project_versions_by_numbers(
        &self,
        project_id: i64,
        numbers: &[i64],
    ) -> TerrierResult<Vec<WsProjectVersion>> {
        let url = self
            .http
            .url(&format!("/projects/{}/versions/by-numbers", project_id));
        debug!(url = %url, count = numbers.len(), "fetching versions by number");
        self.http.post_json(&url, &NumbersBody { numbers }).await
    }

    pub async fn get_first_project_versions(
        &self,
        project_ids: &[i64],
    ) -> TerrierResult<Vec<WsProjectVersion>> {
        let url = self.http.url("/versions/first");
        debug!(url = %url, "fetching first project versions");
        self.http.post_json(&url, &IdsBody { ids: project_ids }).await
    }

    pub async fn get_last_project_versions(
        &self,
        project_ids: &[i64],
    ) -> TerrierResult<Vec<WsProjectVersion>> {
        let url = self.http.url("/versions/last");
        debug!(url = %url, "fetching last project versions");
        self.http.post_json(&url, &IdsBody { ids: project_ids }).await
    }

    pub async fn get_versions_count(&self, project_id: i64) -> TerrierResult<u64> {
        let url = self
            .http
            .url(&format!("/projects/{}/versions/count", project_id));
        debug!(url = %url, "fetching version count");
        self.http.get_json(&url).await
    }

    pub async fn get_versions_statistics(
        &self,
        version_ids: &[i64],
    ) -> TerrierResult<Vec<WsVersionStats>> {
        let url = self.http.url("/versions/statistics");
        debug!(url = %url, count = version_ids.len(), "fetching version statistics");
        self.http.post_json(&url, &IdsBody { ids: version_ids }).await
    }

    /// Root of a project's source tree; `None` when the project has none.
    pub async fn get_root_directory(&self, project_id: i64) -> TerrierResult<Option<WsDirectory>> {
        let url = self.http.url(&format!("/projects/{}/root", project_id));
        debug!(url = %url, "fetching root directory");
        self.http.get_json_optional(&url).await
    }

    pub async fn get_files_in_directory(
        &self,
        version_id: i64,
        directory_id: i64,
    ) -> TerrierResult<Vec<WsProjectFile>> {
        let url = self.http.url(&format!(
            "/versions/{}/directories/{}/files",
            version_id, directory_id
        ));
        debug!(url = %url, "fetching files in directory");
        self.http.get_json(&url).await
    }

    pub async fn get_files_by_version(&self, version_id: i64) -> TerrierResult<Vec<WsProjectFile>> {
        let url = self.http.url(&format!("/versions/{}/files", version_id));
        debug!(url = %url, "fetching files in version");
        self.http.get_json(&url).await
    }

    pub async fn get_files_count_by_version(&self, version_id: i64) -> TerrierResult<u64> {
        let url = self.http.url(&format!("/versions/{}/files/count", version_id));
        debug!(url = %url, "fetching file count");
        self.http.get_json(&url).await
    }

    // ---------------------------------------------------------------------
    // Metric accessor
    // ---------------------------------------------------------------------

    pub async fn get_project_evaluated_metrics(
        &self,
        project_id: i64,
    ) -> TerrierResult<Vec<WsMetric>> {
        let url = self.http.url(&format!("/projects/{}/metrics", project_id));
        debug!(url = %url, "fetching evaluated metrics");
        self.http.get_json(&url).await
    }

    pub async fn get_metrics_by_resources(
        &self,
        request: &MetricsRequest,
    ) -> TerrierResult<Vec<WsMetric>> {
        let url = self.http.url("/metrics/by-resources");
        debug!(url = %url, "fetching metrics by resources");
        self.http.post_json(&url, request).await
    }

    pub async fn get_metric_types_by_ids(&self, ids: &[i64]) -> TerrierResult<Vec<WsMetricType>> {
        let url = self.http.url("/metrics/types/by-ids");
        debug!(url = %url, count = ids.len(), "fetching metric types by id");
        self.http.post_json(&url, &IdsBody { ids }).await
    }

    pub async fn get_metrics_result(
        &self,
        request: &MetricsResultRequest,
    ) -> TerrierResult<Vec<WsResultEntry>> {
        let url = self.http.url("/metrics/results");
        debug!(url = %url, resources = request.resource_ids.len(), "fetching metric results");
        self.http.post_json(&url, request).await
    }

    // ---------------------------------------------------------------------
    // User accessor
    // ---------------------------------------------------------------------

    pub async fn get_users_by_ids(&self, ids: &[i64]) -> TerrierResult<Vec<WsUser>> {
        let url = self.http.url("/users/by-ids");
        debug!(url = %url, count = ids.len(), "fetching users by id");
        self.http.post_json(&url, &IdsBody { ids }).await
    }

    pub async fn get_user_by_name(&self, name: &str) -> TerrierResult<Option<WsUser>> {
        let url = helpers::join_segments(&self.http.base_url, &["users", "by-name", name])?;
        debug!(url = %url, "fetching user by name");
        self.http.get_json_optional(&url).await
    }

    pub async fn get_message_of_the_day(&self) -> TerrierResult<Option<String>> {
        let url = self.http.url("/motd");
        debug!(url = %url, "fetching message of the day");
        self.http.get_json_optional(&url).await
    }

    /// Register a pending user account; `false` when the framework refuses it.
    pub async fn create_pending_user(
        &self,
        user: &str,
        password: &str,
        email: &str,
    ) -> TerrierResult<bool> {
        let url = self.http.url("/users/pending");
        debug!(url = %url, user, "registering pending user");
        self.http
            .post_json(
                &url,
                &PendingUserBody {
                    user,
                    password,
                    email,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = TerrierConfig::default().with_url("http://localhost:8088/ws/");
        let client = AlitheiaClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8088/ws");
        assert!(client.is_authenticated());
    }

    #[test]
    fn test_anonymous_client() {
        let config = TerrierConfig::default();
        let client = AlitheiaClient::with_credentials(&config, Credentials::None).unwrap();
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_user_agent() {
        assert!(TERRIER_USER_AGENT.starts_with("alitheia-terrier/"));
    }
}

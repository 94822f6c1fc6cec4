//! Data-access facade used by the web front-end.
//!
//! Every operation checks the session, calls one accessor and turns the wire
//! records into presentation objects. Failures come back as `Err` from the
//! call that hit them; nothing is accumulated between calls.
//!
//! Lookups of a single object return `Ok(None)` when the framework has no
//! such object, list queries return an empty `Vec`. Connection or remote
//! failures are always `Err`, never an empty or missing value.

use std::sync::Arc;

use alitheia_config::PluginConfig;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::connection::TerrierConnection;
use crate::error::TerrierResult;
use crate::model::{Directory, File, Metric, MetricResult, Project, User, Version, VersionStats};
use crate::resolver::{BatchFetcher, PartialCacheResolver, Resolution, ResolverStats};
use crate::types::{MetricsRequest, MetricsResultRequest, TerrierConfig, WsMetric};

/// Resolves metric type ids through the metric accessor.
///
/// Each fetch is a single POST, which the client never retries, so one
/// `resolve_batch` costs at most one round-trip. Callers wanting a retry
/// run `resolve_batch` again.
#[derive(Debug, Clone)]
pub struct MetricTypeFetcher {
    connection: Arc<TerrierConnection>,
}

impl MetricTypeFetcher {
    pub fn new(connection: Arc<TerrierConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl BatchFetcher<i64, String> for MetricTypeFetcher {
    async fn fetch_values(&self, keys: &[i64]) -> TerrierResult<Vec<(i64, String)>> {
        self.connection.ensure_connected().await?;
        let types = self
            .connection
            .client()
            .get_metric_types_by_ids(keys)
            .await?;
        Ok(types.into_iter().map(|t| (t.id, t.type_name)).collect())
    }
}

/// Metric type id → type name resolver.
pub type MetricTypeResolver = PartialCacheResolver<i64, String, MetricTypeFetcher>;

/// Entry point for retrieving data from the Alitheia framework.
pub struct Terrier {
    connection: Arc<TerrierConnection>,
    metric_types: MetricTypeResolver,
}

impl Terrier {
    /// Create a facade; call [`Terrier::connect`] before querying.
    pub fn new(config: TerrierConfig) -> TerrierResult<Self> {
        Ok(Self::with_connection(Arc::new(TerrierConnection::new(
            config,
        )?)))
    }

    /// Create a facade from a configuration set, falling back to the
    /// defaults for every missing setting.
    pub fn from_plugin_config<C: PluginConfig + ?Sized>(config: &C) -> TerrierResult<Self> {
        Self::new(TerrierConfig::from_plugin_config(config))
    }

    pub fn with_connection(connection: Arc<TerrierConnection>) -> Self {
        let metric_types = PartialCacheResolver::new(MetricTypeFetcher::new(connection.clone()));
        Self {
            connection,
            metric_types,
        }
    }

    pub async fn connect(&self) -> TerrierResult<()> {
        self.connection.connect().await
    }

    pub fn connection(&self) -> &TerrierConnection {
        &self.connection
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    // ---------------------------------------------------------------------
    // Projects and versions
    // ---------------------------------------------------------------------

    pub async fn project(&self, project_id: i64) -> TerrierResult<Option<Project>> {
        self.connection.ensure_connected().await?;
        let projects = self
            .connection
            .client()
            .get_projects_by_ids(&[project_id])
            .await?;
        if projects.is_empty() {
            debug!(project_id, "project does not exist");
        }
        Ok(projects.into_iter().next().map(Project::from))
    }

    pub async fn evaluated_projects(&self) -> TerrierResult<Vec<Project>> {
        self.connection.ensure_connected().await?;
        let projects = self.connection.client().get_evaluated_projects().await?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    /// A version of the given project; `None` if it does not exist or
    /// belongs to another project.
    pub async fn version(&self, project_id: i64, version_id: i64) -> TerrierResult<Option<Version>> {
        self.connection.ensure_connected().await?;
        let versions = self
            .connection
            .client()
            .get_project_versions_by_ids(&[version_id])
            .await?;
        Ok(versions
            .into_iter()
            .find(|v| v.id == version_id && v.project_id == project_id)
            .map(Version::from))
    }

    pub async fn versions_by_number(
        &self,
        project_id: i64,
        numbers: &[i64],
    ) -> TerrierResult<Vec<Version>> {
        self.connection.ensure_connected().await?;
        if numbers.is_empty() {
            return Ok(Vec::new());
        }
        let versions = self
            .connection
            .client()
            .get_project_versions_by_numbers(project_id, numbers)
            .await?;
        Ok(versions.into_iter().map(Version::from).collect())
    }

    /// First recorded version of a project.
    pub async fn first_project_version(&self, project_id: i64) -> TerrierResult<Option<Version>> {
        self.connection.ensure_connected().await?;
        let versions = self
            .connection
            .client()
            .get_first_project_versions(&[project_id])
            .await?;
        Ok(versions.into_iter().next().map(Version::from))
    }

    /// Most recent recorded version (HEAD) of a project.
    pub async fn last_project_version(&self, project_id: i64) -> TerrierResult<Option<Version>> {
        self.connection.ensure_connected().await?;
        let versions = self
            .connection
            .client()
            .get_last_project_versions(&[project_id])
            .await?;
        Ok(versions.into_iter().next().map(Version::from))
    }

    pub async fn versions_count(&self, project_id: i64) -> TerrierResult<u64> {
        self.connection.ensure_connected().await?;
        self.connection
            .client()
            .get_versions_count(project_id)
            .await
    }

    pub async fn versions_statistics(&self, version_ids: &[i64]) -> TerrierResult<Vec<VersionStats>> {
        self.connection.ensure_connected().await?;
        if version_ids.is_empty() {
            return Ok(Vec::new());
        }
        let stats = self
            .connection
            .client()
            .get_versions_statistics(version_ids)
            .await?;
        Ok(stats.into_iter().map(VersionStats::from).collect())
    }

    // ---------------------------------------------------------------------
    // Source tree
    // ---------------------------------------------------------------------

    pub async fn root_directory(&self, project_id: i64) -> TerrierResult<Option<Directory>> {
        self.connection.ensure_connected().await?;
        let root = self
            .connection
            .client()
            .get_root_directory(project_id)
            .await?;
        Ok(root.map(Directory::from))
    }

    pub async fn files_in_directory(
        &self,
        version_id: i64,
        directory_id: i64,
    ) -> TerrierResult<Vec<File>> {
        self.connection.ensure_connected().await?;
        let files = self
            .connection
            .client()
            .get_files_in_directory(version_id, directory_id)
            .await?;
        Ok(files.into_iter().map(File::from).collect())
    }

    pub async fn files_in_version(&self, version_id: i64) -> TerrierResult<Vec<File>> {
        self.connection.ensure_connected().await?;
        let files = self
            .connection
            .client()
            .get_files_by_version(version_id)
            .await?;
        Ok(files.into_iter().map(File::from).collect())
    }

    pub async fn files_count(&self, version_id: i64) -> TerrierResult<u64> {
        self.connection.ensure_connected().await?;
        self.connection
            .client()
            .get_files_count_by_version(version_id)
            .await
    }

    // ---------------------------------------------------------------------
    // Metrics
    // ---------------------------------------------------------------------

    /// Metrics evaluated on a project, with their type names resolved.
    pub async fn metrics_for_project(&self, project_id: i64) -> TerrierResult<Vec<Metric>> {
        self.connection.ensure_connected().await?;
        let metrics = self
            .connection
            .client()
            .get_project_evaluated_metrics(project_id)
            .await?;
        Ok(self.with_metric_types(metrics).await)
    }

    /// Every metric installed in the framework.
    pub async fn all_metrics(&self) -> TerrierResult<Vec<Metric>> {
        self.connection.ensure_connected().await?;
        let metrics = self
            .connection
            .client()
            .get_metrics_by_resources(&MetricsRequest::all_installed())
            .await?;
        Ok(self.with_metric_types(metrics).await)
    }

    /// Resolve metric type names, from the local cache where possible.
    pub async fn metric_types_by_id(&self, type_ids: &[i64]) -> Resolution<i64, String> {
        self.metric_types.resolve_batch(type_ids).await
    }

    pub async fn metric_type_stats(&self) -> ResolverStats {
        self.metric_types.stats().await
    }

    /// Attach type names in one batch. Unresolved types leave
    /// `metric_type` empty instead of failing the listing.
    async fn with_metric_types(&self, metrics: Vec<WsMetric>) -> Vec<Metric> {
        if metrics.is_empty() {
            return Vec::new();
        }

        let type_ids: Vec<i64> = metrics.iter().map(|m| m.metric_type_id).collect();
        let resolution = self.metric_types.resolve_batch(&type_ids).await;

        if let Some(e) = &resolution.failure {
            warn!(error = %e, "metric types query failed, listing metrics without types");
        } else if !resolution.unresolved.is_empty() {
            warn!(
                missing = resolution.unresolved.len(),
                "one or more metric types cannot be found"
            );
        }

        metrics
            .into_iter()
            .map(|m| {
                let metric_type = resolution.values.get(&m.metric_type_id).cloned();
                Metric::from_wire(m, metric_type)
            })
            .collect()
    }

    pub async fn results(&self, request: &MetricsResultRequest) -> TerrierResult<Vec<MetricResult>> {
        self.connection.ensure_connected().await?;
        let results = self.connection.client().get_metrics_result(request).await?;
        Ok(results.into_iter().map(MetricResult::from).collect())
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub async fn user_by_id(&self, user_id: i64) -> TerrierResult<Option<User>> {
        self.connection.ensure_connected().await?;
        let users = self
            .connection
            .client()
            .get_users_by_ids(&[user_id])
            .await?;
        Ok(users.into_iter().next().map(User::from))
    }

    pub async fn user_by_name(&self, name: &str) -> TerrierResult<Option<User>> {
        self.connection.ensure_connected().await?;
        let user = self.connection.client().get_user_by_name(name).await?;
        Ok(user.map(User::from))
    }

    /// Message of the day shown on the front page, if one is set.
    pub async fn message_of_the_day(&self) -> TerrierResult<Option<String>> {
        self.connection.ensure_connected().await?;
        let motd = self.connection.client().get_message_of_the_day().await?;
        Ok(motd.filter(|m| !m.trim().is_empty()))
    }

    /// Add a pending user; `false` when the framework refuses the account.
    pub async fn register_user(&self, name: &str, password: &str, email: &str) -> TerrierResult<bool> {
        self.connection.ensure_connected().await?;
        self.connection
            .client()
            .create_pending_user(name, password, email)
            .await
    }

    pub async fn login_user(&self, user: &str, password: &str) -> TerrierResult<bool> {
        self.connection.login_user(user, password).await
    }

    pub async fn logout_user(&self, user: &str) -> TerrierResult<()> {
        self.connection.logout_user(user).await
    }
}

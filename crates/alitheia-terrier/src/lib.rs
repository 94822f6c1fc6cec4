//! Data-access layer between the Alitheia web front-end and the framework's
//! web services.
//!
//! This crate provides:
//!
//! - HTTP client for the project, metric and user accessors
//! - Session handling with the unprivileged front-end account
//! - [`Terrier`], the facade returning presentation objects
//! - [`PartialCacheResolver`], batch key resolution through a grow-only
//!   local cache (used for metric type names)
//!
//! # Quick Start
//!
//! ```no_run
//! use alitheia_terrier::{Terrier, TerrierConfig};
//!
//! # async fn example() -> alitheia_terrier::TerrierResult<()> {
//! let terrier = Terrier::new(TerrierConfig::from_env())?;
//! terrier.connect().await?;
//!
//! for project in terrier.evaluated_projects().await? {
//!     for metric in terrier.metrics_for_project(project.id).await? {
//!         println!("{}: {} ({:?})", project.name, metric.mnemonic, metric.metric_type);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ALITHEIA_FRAMEWORK_URL` | Web-service base URL (default: `http://localhost:8088/sqooss/ws`) |
//! | `ALITHEIA_UNPRIV_USER` | Unprivileged account name |
//! | `ALITHEIA_UNPRIV_PASS` | Unprivileged account password |
//! | `ALITHEIA_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `ALITHEIA_MAX_RETRIES` | Max retries for transient failures (default: 3) |

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod model;
pub mod resolver;
pub mod terrier;
pub mod types;

// Re-export main types
pub use auth::Credentials;
pub use client::{AlitheiaClient, TERRIER_USER_AGENT};
pub use connection::TerrierConnection;
pub use error::{TerrierError, TerrierResult};
pub use model::{Directory, File, Metric, MetricResult, Project, User, Version, VersionStats};
pub use resolver::{BatchFetcher, PartialCacheResolver, Resolution, ResolverStats};
pub use terrier::{MetricTypeFetcher, MetricTypeResolver, Terrier};
pub use types::{
    MetricsRequest, MetricsResultRequest, TerrierConfig, WsDirectory, WsMetric, WsMetricType,
    WsProjectFile, WsProjectVersion, WsResultEntry, WsStoredProject, WsUser, WsVersionStats,
    CFG_FRAMEWORK_MAX_RETRIES, CFG_FRAMEWORK_TIMEOUT, CFG_FRAMEWORK_URL, CFG_UNPRIV_PASS,
    CFG_UNPRIV_USER,
};

//! Configuration sets for Alitheia plugins.
//!
//! A plugin (usually a metric) carries one flat configuration set of string
//! keys and string values. [`PluginConfig`] is the read interface used by the
//! rest of the system, [`MapPluginConfig`] the map-backed implementation.
//!
//! # Quick Start
//!
//! ```
//! use alitheia_config::{MapPluginConfig, PluginConfig, KEY_AUTOINSTALL};
//!
//! let config = MapPluginConfig::from_yaml_str("autoinstall: true\nlanguages: rust, java")?;
//! assert!(config.contains_key(KEY_AUTOINSTALL));
//! assert_eq!(
//!     config.get_string_array("languages"),
//!     Some(vec!["rust".to_string(), "java".to_string()])
//! );
//! # Ok::<(), alitheia_config::ConfigError>(())
//! ```

pub mod error;
pub mod plugin;

pub use error::{ConfigError, ConfigResult};
pub use plugin::{MapPluginConfig, PluginConfig, KEY_AUTOINSTALL};

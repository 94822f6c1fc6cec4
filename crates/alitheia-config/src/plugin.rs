//! Plugin configuration interface and its map-backed implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Obligatory key: whether the plugin is installed automatically on startup.
pub const KEY_AUTOINSTALL: &str = "autoinstall";

/// The configuration set of a single plugin.
///
/// Values are always stored as strings. Typed accessors decode them:
/// string arrays are comma separated, byte arrays are Base64.
pub trait PluginConfig {
    /// The complete configuration set.
    fn configuration(&self) -> &BTreeMap<String, String>;

    fn contains_key(&self, key: &str) -> bool {
        self.configuration().contains_key(key)
    }

    fn key_set(&self) -> BTreeSet<String> {
        self.configuration().keys().cloned().collect()
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        self.configuration().get(key).map(String::as_str)
    }

    /// Decode a Base64 value.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the stored
    /// value is not valid Base64.
    fn get_byte_array(&self, key: &str) -> ConfigResult<Option<Vec<u8>>> {
        let Some(raw) = self.get_string(key) else {
            return Ok(None);
        };
        BASE64
            .decode(raw.trim())
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: format!("not valid base64: {}", e),
            })
    }

    /// Split a comma separated value, trimming items and dropping empty ones.
    fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.get_string(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
    }
}

/// Map-backed plugin configuration.
///
/// Serializes as a flat mapping of string keys to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapPluginConfig {
    entries: BTreeMap<String, String>,
}

impl MapPluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Parse a flat YAML mapping.
    ///
    /// Scalars are stored in their textual form, sequences of scalars are
    /// joined with commas so they read back through
    /// [`PluginConfig::get_string_array`]. Nested mappings are rejected.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: Value = serde_yaml::from_str(content)?;
        let mapping = match value {
            Value::Mapping(m) => m,
            Value::Null => return Ok(Self::new()),
            _ => {
                return Err(ConfigError::Parse {
                    message: "top-level value must be a mapping".to_string(),
                })
            }
        };

        let mut entries = BTreeMap::new();
        for (k, v) in mapping {
            let key = scalar_to_string(&k).ok_or_else(|| ConfigError::Parse {
                message: format!("unsupported key: {:?}", k),
            })?;
            let value = match &v {
                Value::Sequence(items) => items
                    .iter()
                    .map(|item| {
                        scalar_to_string(item).ok_or_else(|| ConfigError::InvalidValue {
                            key: key.clone(),
                            reason: "sequence items must be scalars".to_string(),
                        })
                    })
                    .collect::<ConfigResult<Vec<_>>>()?
                    .join(","),
                other => scalar_to_string(other).ok_or_else(|| ConfigError::InvalidValue {
                    key: key.clone(),
                    reason: "nested mappings are not supported".to_string(),
                })?,
            };
            entries.insert(key, value);
        }

        debug!(keys = entries.len(), "parsed plugin configuration");
        Ok(Self { entries })
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Whether the plugin asks to be installed on startup.
    ///
    /// Missing key means `false`; `1`, `true` and `yes` (any case) mean `true`.
    pub fn autoinstall(&self) -> bool {
        self.get_string(KEY_AUTOINSTALL)
            .map(|v| {
                let v = v.trim();
                v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
            })
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PluginConfig for MapPluginConfig {
    fn configuration(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapPluginConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_array_trims_and_drops_empty() {
        let config = MapPluginConfig::new().with("exts", " .rs, .java ,, .c ");
        assert_eq!(
            config.get_string_array("exts"),
            Some(vec![
                ".rs".to_string(),
                ".java".to_string(),
                ".c".to_string()
            ])
        );
        assert_eq!(config.get_string_array("missing"), None);
    }

    #[test]
    fn test_byte_array_base64() {
        let config = MapPluginConfig::new()
            .with("blob", "aGVsbG8=")
            .with("broken", "not base64!");

        assert_eq!(
            config.get_byte_array("blob").unwrap(),
            Some(b"hello".to_vec())
        );
        assert!(config.get_byte_array("missing").unwrap().is_none());
        assert!(matches!(
            config.get_byte_array("broken"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_autoinstall_parsing() {
        assert!(!MapPluginConfig::new().autoinstall());
        assert!(MapPluginConfig::new()
            .with(KEY_AUTOINSTALL, "TRUE")
            .autoinstall());
        assert!(MapPluginConfig::new().with(KEY_AUTOINSTALL, "1").autoinstall());
        assert!(!MapPluginConfig::new()
            .with(KEY_AUTOINSTALL, "no")
            .autoinstall());
    }

    #[test]
    fn test_yaml_scalars_and_sequences() {
        let yaml = "autoinstall: true\nthreshold: 42\nlangs:\n  - rust\n  - java\nempty:\n";
        let config = MapPluginConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.get_string("autoinstall"), Some("true"));
        assert_eq!(config.get_string("threshold"), Some("42"));
        assert_eq!(config.get_string("langs"), Some("rust,java"));
        assert_eq!(config.get_string("empty"), Some(""));
        assert!(config.autoinstall());
    }

    #[test]
    fn test_yaml_rejects_nested_mapping() {
        let yaml = "outer:\n  inner: 1\n";
        assert!(matches!(
            MapPluginConfig::from_yaml_str(yaml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_yaml_rejects_non_mapping() {
        assert!(matches!(
            MapPluginConfig::from_yaml_str("- a\n- b\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_serializes_as_flat_mapping() {
        let config = MapPluginConfig::new()
            .with(KEY_AUTOINSTALL, "true")
            .with("exts", ".rs,.c");
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("entries"));
        assert_eq!(MapPluginConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_empty_document() {
        let config = MapPluginConfig::from_yaml_str("").unwrap();
        assert!(config.is_empty());
        assert!(config.key_set().is_empty());
    }
}

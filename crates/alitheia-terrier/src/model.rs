//! Presentation objects handed to the web front-end.
//!
//! These are plain values built from the wire records. They never call back
//! into the facade; anything they need is resolved before construction.

use serde::Serialize;

use crate::types::{
    WsDirectory, WsMetric, WsProjectFile, WsProjectVersion, WsResultEntry, WsStoredProject,
    WsUser, WsVersionStats,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub bug_tracker: Option<String>,
    pub mailing_list: Option<String>,
    pub repository: Option<String>,
}

impl From<WsStoredProject> for Project {
    fn from(p: WsStoredProject) -> Self {
        Self {
            id: p.id,
            name: p.name,
            website: p.website,
            contact: p.contact,
            bug_tracker: p.bugs,
            mailing_list: p.mail,
            repository: p.repository,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Version {
    pub id: i64,
    pub project_id: i64,
    /// Revision number inside the project.
    pub number: i64,
    pub timestamp: Option<i64>,
    pub committer_id: Option<i64>,
    pub commit_message: Option<String>,
}

impl From<WsProjectVersion> for Version {
    fn from(v: WsProjectVersion) -> Self {
        Self {
            id: v.id,
            project_id: v.project_id,
            number: v.version,
            timestamp: v.timestamp,
            committer_id: v.committer_id,
            commit_message: v.commit_msg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directory {
    pub id: i64,
    pub path: String,
}

impl Directory {
    /// The source tree root.
    pub fn is_root(&self) -> bool {
        self.path.is_empty() || self.path == "/"
    }
}

impl From<WsDirectory> for Directory {
    fn from(d: WsDirectory) -> Self {
        Self {
            id: d.id,
            path: d.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: i64,
    pub version_id: i64,
    pub directory_id: Option<i64>,
    pub name: String,
    pub status: Option<String>,
    pub is_directory: bool,
}

impl File {
    /// Last path component.
    pub fn short_name(&self) -> &str {
        self.name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.name)
    }

    pub fn is_deleted(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("DELETED"))
            .unwrap_or(false)
    }
}

impl From<WsProjectFile> for File {
    fn from(f: WsProjectFile) -> Self {
        Self {
            id: f.id,
            version_id: f.project_version_id,
            directory_id: f.directory_id,
            name: f.file_name,
            status: f.status,
            is_directory: f.is_directory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub id: i64,
    pub mnemonic: String,
    pub description: Option<String>,
    pub metric_type_id: i64,
    /// Resolved metric type name; `None` when the type could not be resolved.
    pub metric_type: Option<String>,
    pub plugin_id: Option<i64>,
}

impl Metric {
    pub fn from_wire(m: WsMetric, metric_type: Option<String>) -> Self {
        Self {
            id: m.id,
            mnemonic: m.mnemonic,
            description: m.description,
            metric_type_id: m.metric_type_id,
            metric_type,
            plugin_id: m.plugin_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

impl From<WsUser> for User {
    fn from(u: WsUser) -> Self {
        Self {
            id: u.id,
            name: u.user_name,
            email: u.email,
        }
    }
}

/// One metric measurement on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricResult {
    pub resource_id: i64,
    pub mnemonic: String,
    pub value: String,
    pub mime_type: Option<String>,
}

impl MetricResult {
    /// Numeric value, when the result is a number.
    pub fn as_f64(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

impl From<WsResultEntry> for MetricResult {
    fn from(r: WsResultEntry) -> Self {
        Self {
            resource_id: r.resource_id,
            mnemonic: r.mnemonic,
            value: r.result,
            mime_type: r.mime_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStats {
    pub version_id: i64,
    pub added: u64,
    pub modified: u64,
    pub deleted: u64,
    pub total: u64,
}

impl VersionStats {
    pub fn changed(&self) -> u64 {
        self.added + self.modified + self.deleted
    }
}

impl From<WsVersionStats> for VersionStats {
    fn from(s: WsVersionStats) -> Self {
        Self {
            version_id: s.version_id,
            added: s.added,
            modified: s.modified,
            deleted: s.deleted,
            total: s.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_short_name() {
        let file = File::from(WsProjectFile {
            id: 1,
            project_version_id: 10,
            directory_id: Some(2),
            file_name: "/trunk/src/main.c".to_string(),
            status: Some("deleted".to_string()),
            is_directory: false,
        });
        assert_eq!(file.short_name(), "main.c");
        assert!(file.is_deleted());

        let dir = File {
            name: "/trunk/src/".to_string(),
            is_directory: true,
            status: None,
            ..file
        };
        assert_eq!(dir.short_name(), "src");
        assert!(!dir.is_deleted());
    }

    #[test]
    fn test_project_from_wire() {
        let project = Project::from(WsStoredProject {
            id: 4,
            name: "KDE".to_string(),
            website: Some("https://kde.org".to_string()),
            contact: None,
            bugs: Some("https://bugs.kde.org".to_string()),
            mail: None,
            repository: None,
        });
        assert_eq!(project.name, "KDE");
        assert_eq!(project.bug_tracker.as_deref(), Some("https://bugs.kde.org"));
    }

    #[test]
    fn test_result_numeric_value() {
        let result = MetricResult::from(WsResultEntry {
            resource_id: 1,
            mnemonic: "LOC".to_string(),
            result: " 1200 ".to_string(),
            mime_type: Some("type/integer".to_string()),
        });
        assert_eq!(result.as_f64(), Some(1200.0));

        let text = MetricResult {
            value: "n/a".to_string(),
            ..result
        };
        assert_eq!(text.as_f64(), None);
    }

    #[test]
    fn test_stats_changed() {
        let stats = VersionStats::from(WsVersionStats {
            version_id: 3,
            added: 2,
            modified: 5,
            deleted: 1,
            total: 40,
        });
        assert_eq!(stats.changed(), 8);
        assert!(Directory {
            id: 1,
            path: "/".to_string()
        }
        .is_root());
    }
}

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One parsed history entry.
///
/// Every field is the raw text emitted by the log command for that position;
/// no semantic validation is applied. `repo_path` is set by the pipeline from
/// the repository being collected, never parsed from the entry itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub ts: String,
    pub node_id: String,
    pub rev_id: String,
    pub parent_ids: String,
    pub author: String,
    pub tags: String,
    pub branch: String,
    pub diffstat: String,
    pub files: String,
    pub graph_node: String,
    pub repo_path: String,
}

/// A failure captured as data instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    /// Capture time, RFC 3339 UTC.
    pub ts: String,
    /// Rendered text of the underlying error.
    pub message: String,
    /// Repository the failure occurred against.
    pub repo_path: String,
}

impl ErrorEvent {
    /// Capture a failure against a repository, stamped with the current time.
    pub fn capture(message: impl Into<String>, repo: &Path) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            message: message.into(),
            repo_path: repo.display().to_string(),
        }
    }
}

/// Per-repository aggregate of parsed records and captured failures.
///
/// Produced by one obtain call and consumed once by one persist call. Both
/// sequences preserve input order independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Results {
    pub records: Vec<LogRecord>,
    pub events: Vec<ErrorEvent>,
}

impl Results {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.events.is_empty()
    }
}

/// Ordered list of repository paths making up one run.
pub type RepoList = Vec<PathBuf>;

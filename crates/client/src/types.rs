use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a URL points at, as reported by a backend's stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
}

/// Metadata for a single object or directory, returned by [`Client::stat`].
///
/// [`Client::stat`]: crate::Client::stat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Full URL of the object.
    pub name: String,
    /// Object size in bytes (0 for directories).
    pub size: u64,
    pub kind: ContentKind,
    pub modified: DateTime<Utc>,
}

impl Content {
    /// Returns `true` if this content denotes a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == ContentKind::Dir
    }
}

/// One concrete unit of transfer work: copy `size` bytes from
/// `source_url` to `target_url`.
///
/// Jobs are produced by the planner, appended to the session data log as
/// one JSON line each, and consumed by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyJob {
    pub source_url: String,
    pub target_url: String,
    pub size: u64,
}

impl CopyJob {
    pub fn new(source_url: impl Into<String>, target_url: impl Into<String>, size: u64) -> Self {
        Self {
            source_url: source_url.into(),
            target_url: target_url.into(),
            size,
        }
    }
}

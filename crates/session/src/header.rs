//! Session header and status message types.
//!
//! Field names in the serialized form are fixed — they are the on-disk
//! format older engines wrote and the version sweep inspects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SESSION_VERSION;

/// Boolean command option, stored as an ordered key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoolFlag {
    pub key: String,
    pub value: bool,
}

/// Integer command option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntFlag {
    pub key: String,
    pub value: i64,
}

/// String command option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StringFlag {
    pub key: String,
    pub value: String,
}

/// Versioned session metadata, persisted as the header file.
///
/// Options are ordered lists rather than maps so the command's flag order
/// survives a round trip; keeping them duplicate-free is the caller's
/// responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHeader {
    pub version: String,
    #[serde(rename = "time")]
    pub when: DateTime<Utc>,
    #[serde(rename = "workingFolder")]
    pub root_path: String,
    pub command_type: String,
    #[serde(rename = "cmdArgs")]
    pub command_args: Vec<String>,
    #[serde(rename = "cmdBoolFlag")]
    pub bool_flags: Vec<BoolFlag>,
    #[serde(rename = "cmdIntFlag")]
    pub int_flags: Vec<IntFlag>,
    #[serde(rename = "cmdStringFlag")]
    pub string_flags: Vec<StringFlag>,
    /// URL of the last successfully completed unit; empty means none.
    pub last_copied: String,
    pub total_bytes: i64,
    pub total_objects: i64,
}

impl SessionHeader {
    /// Creates a header at the current schema version, stamped now (UTC).
    pub fn new() -> Self {
        Self {
            version: SESSION_VERSION.to_string(),
            when: Utc::now(),
            root_path: String::new(),
            command_type: String::new(),
            command_args: Vec::new(),
            bool_flags: Vec::new(),
            int_flags: Vec::new(),
            string_flags: Vec::new(),
            last_copied: String::new(),
            total_bytes: 0,
            total_objects: 0,
        }
    }
}

impl Default for SessionHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Machine-readable session status record for the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessage {
    pub status: String,
    pub session_id: String,
    pub time: DateTime<Utc>,
    pub command_type: String,
    pub command_args: Vec<String>,
}

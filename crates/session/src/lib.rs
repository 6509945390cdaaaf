//! Persistent, crash-resumable transfer sessions.
//!
//! A session records one transfer command's progress on disk as two files:
//! a JSON header (command, options, `lastCopied` marker, byte/object
//! counters) and an append-only data log of planned copy jobs. A long
//! transfer can be interrupted at any point and resumed from the header's
//! cut point without redoing completed work.
//!
//! [`SessionStore`] owns the on-disk registry (create / load / list /
//! remove plus the startup stale-version sweep), [`Session`] owns one
//! session's mutable state behind a lock, and [`ResumeFilter`] replays the
//! original enumeration order to decide which jobs were already done.

mod data_log;
pub mod header;
pub mod resume;
pub mod session;
pub mod store;

pub use header::{BoolFlag, IntFlag, SessionHeader, SessionMessage, StringFlag};
pub use resume::{ResumeFilter, ResumeState};
pub use session::Session;
pub use store::SessionStore;

/// Current session schema version. A persisted session with any other
/// version tag is discarded by the startup sweep, never migrated.
pub const SESSION_VERSION: &str = "1";

/// Errors produced by session operations.
///
/// Operations that leave no usable session behind (creating the data log,
/// opening an existing session's data log) are unrecoverable for that
/// session; the caller decides whether that terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session {id}: I/O error: {source}")]
    SessionIo {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("corrupt session record for {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode session record for {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("data log already closed: {0}")]
    LogClosed(String),
}

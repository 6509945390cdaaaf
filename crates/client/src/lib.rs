//! Storage-client boundary and copy-plan types.
//!
//! This crate defines the seams between the transfer engine and its
//! collaborators: the storage backends that move bytes ([`Client`] /
//! [`ClientFactory`]), the copy-shape classifier that turns a source/target
//! URL pair into concrete work ([`ShapeClassifier`]), and the shared
//! [`CopyJob`] / [`PlanEntry`] types flowing between the planner, the
//! session data log and the executor. The engine never implements a
//! backend itself — real object-store and filesystem adapters live outside
//! this workspace and plug in through these traits.

pub mod classify;
pub mod client;
pub mod types;

pub use classify::{CopyShape, PlanEntry, PlanError, ShapeClassifier};
pub use client::{Client, ClientFactory, get_source, put_target, url_to_stat};
pub use types::{Content, ContentKind, CopyJob};

/// Errors produced at the storage-client boundary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("{url}: {message}")]
    Backend { url: String, message: String },
}

//! Copy-shape classification boundary.
//!
//! Every source/target URL pair reduces to one of five canonical shapes
//! before any byte moves. The classification algorithm itself (stat calls,
//! wildcard handling, recursion markers) lives in the collaborating
//! classifier; the engine only dispatches on the resulting tag.

use crate::types::CopyJob;

/// Canonical classification of a source/target URL pair.
///
/// - `FileToFile`: single file to single file.
/// - `FileToDir`: single file placed under a directory.
/// - `FileToManyDirs`: single file fanned out to a set of directories.
/// - `TreeToDir`: directory tree copied recursively into one directory.
/// - `TreeToManyDirs`: recursive tree fan-out over several directories.
/// - `Unsupported`: any other combination (rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyShape {
    FileToFile,
    FileToDir,
    FileToManyDirs,
    TreeToDir,
    TreeToManyDirs,
    Unsupported,
}

/// Errors carried inside a plan stream instead of aborting it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    /// The source/target combination does not reduce to a supported shape.
    #[error("invalid source/target combination: {source_url} -> {target_url}")]
    UnsupportedShape {
        source_url: String,
        target_url: String,
    },

    /// Classification or expansion failed while inspecting a URL.
    #[error("{url}: {message}")]
    Classify { url: String, message: String },
}

/// One item of a plan stream: a concrete job, or a rejection that the
/// consumer reports without stopping sibling targets.
pub type PlanEntry = Result<CopyJob, PlanError>;

/// External shape classifier.
///
/// Treated as correct and total: `classify` always returns a tag, and
/// `expand` yields a finite sub-stream in a stable order (the same order
/// on every run against unchanged storage — resume correctness depends on
/// it).
pub trait ShapeClassifier: Send + Sync {
    /// Classifies `(sources, target)` into a [`CopyShape`].
    fn classify(&self, sources: &[String], target_url: &str) -> CopyShape;

    /// Builds the single job for a `FileToFile` or `FileToDir` pair,
    /// stating the source to fill in the size.
    fn prepare_single(&self, source_url: &str, target_url: &str) -> PlanEntry;

    /// Expands a `FileToManyDirs` pair into its job sub-stream, produced
    /// lazily in enumeration order.
    fn expand(&self, source_url: &str, target_url: &str)
    -> Box<dyn Iterator<Item = PlanEntry> + Send>;
}

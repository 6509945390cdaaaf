//! Sync fan-out planner.
//!
//! One background producer walks the target list in declared order,
//! classifies each `(source, target)` pair and pushes the resulting jobs
//! into a bounded channel. A rejected target becomes an error entry in
//! the stream instead of aborting it — fan-out is independent per target.
//! Dropping the sender is the end-of-stream signal, so the consumer sees
//! deterministic termination even when every target failed.

use std::sync::Arc;

use ferry_client::{CopyShape, PlanEntry, PlanError, ShapeClassifier};
use tokio::sync::mpsc;
use tracing::debug;

/// Capacity of the plan stream. Classification may block on storage I/O
/// (listing directories), so the producer runs on the blocking pool and
/// stalls when the consumer lags this far behind.
const PLAN_CHANNEL_CAPACITY: usize = 64;

/// Expands `source_url` against `target_urls` into an ordered stream of
/// [`PlanEntry`] values.
///
/// Job order is exactly target-list order, and within a fan-out target,
/// the classifier's own enumeration order — the ordering the resume
/// filter depends on across runs. Only single-file shapes are wired here;
/// recursive tree shapes belong to the recursive copy path and surface as
/// rejections, as does anything unrecognized.
///
/// Must be called from within a tokio runtime.
pub fn plan_sync(
    source_url: String,
    target_urls: Vec<String>,
    classifier: Arc<dyn ShapeClassifier>,
) -> mpsc::Receiver<PlanEntry> {
    let (tx, rx) = mpsc::channel(PLAN_CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        for target_url in target_urls {
            let sources = std::slice::from_ref(&source_url);
            match classifier.classify(sources, &target_url) {
                CopyShape::FileToFile | CopyShape::FileToDir => {
                    let entry = classifier.prepare_single(&source_url, &target_url);
                    if tx.blocking_send(entry).is_err() {
                        return;
                    }
                }
                CopyShape::FileToManyDirs => {
                    for entry in classifier.expand(&source_url, &target_url) {
                        if tx.blocking_send(entry).is_err() {
                            return;
                        }
                    }
                }
                shape => {
                    debug!(?shape, target = %target_url, "rejecting target");
                    let entry = Err(PlanError::UnsupportedShape {
                        source_url: source_url.clone(),
                        target_url,
                    });
                    if tx.blocking_send(entry).is_err() {
                        return;
                    }
                }
            }
        }
        // Sender drops here; the receiver observes end-of-stream.
    });

    rx
}

//! Session-driven sync execution.
//!
//! Ties the pieces together: a fresh session drives the planner and logs
//! each discovered job before executing it; a resumed session replays its
//! data log instead. Every job passes through one resume filter, and the
//! session is saved after each completed unit so a crash leaves an
//! accurate cut point behind.

use std::sync::Arc;

use ferry_client::{
    ClientError, ClientFactory, CopyJob, PlanError, ShapeClassifier, get_source, put_target,
};
use ferry_session::{ResumeFilter, Session, SessionError, SessionHeader};
use tokio::task;
use tracing::{debug, info, warn};

use crate::planner::plan_sync;

/// Errors that abort a sync run outright. Per-target rejections and
/// per-job transfer failures are not among them — those land in the
/// [`SyncSummary`] and the batch continues.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("session {0}: command args hold no source and target URLs")]
    MissingArgs(String),

    #[error("transfer task failed: {0}")]
    Join(#[from] task::JoinError),
}

/// One job the transfer client could not complete.
#[derive(Debug, Clone)]
pub struct FailedJob {
    pub job: CopyJob,
    pub error: String,
}

/// Outcome of one sync run, with enough per-entry context for the
/// reporting layer.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub copied: u64,
    pub skipped: u64,
    pub rejected: Vec<PlanError>,
    pub failed: Vec<FailedJob>,
}

/// Runs (or resumes) the sync the session was created for.
///
/// Source and targets come from the header's command args as recorded at
/// session creation: `[source, target, target, ...]`. On a fresh run the
/// planner stream is consumed as it is produced, so early jobs transfer
/// while later targets are still being classified; on resume
/// (`has_data()`) the data log is replayed without re-planning.
pub async fn run_sync(
    session: Arc<Session>,
    classifier: Arc<dyn ShapeClassifier>,
    clients: Arc<dyn ClientFactory>,
) -> Result<SyncSummary, SyncError> {
    let header = session.header();
    let mut filter = ResumeFilter::new(&header.last_copied);
    let mut summary = SyncSummary::default();

    if session.has_data() {
        info!(session = %session.id(), "resuming from data log");
        for job in session.logged_jobs()? {
            execute_gated(&session, &clients, &mut filter, &mut summary, job).await?;
        }
    } else {
        let (source_url, target_urls) = command_urls(&header)
            .ok_or_else(|| SyncError::MissingArgs(session.id().to_string()))?;
        let mut rx = plan_sync(source_url, target_urls, classifier);
        while let Some(entry) = rx.recv().await {
            match entry {
                Ok(job) => {
                    session.append_job(&job)?;
                    execute_gated(&session, &clients, &mut filter, &mut summary, job).await?;
                }
                Err(e) => {
                    warn!(session = %session.id(), error = %e, "target rejected");
                    summary.rejected.push(e);
                }
            }
        }
    }

    session.save()?;
    Ok(summary)
}

/// Splits the recorded command args into `(source, targets)`.
fn command_urls(header: &SessionHeader) -> Option<(String, Vec<String>)> {
    let (source, targets) = header.command_args.split_first()?;
    if targets.is_empty() {
        return None;
    }
    Some((source.clone(), targets.to_vec()))
}

async fn execute_gated(
    session: &Session,
    clients: &Arc<dyn ClientFactory>,
    filter: &mut ResumeFilter,
    summary: &mut SyncSummary,
    job: CopyJob,
) -> Result<(), SyncError> {
    if filter.should_skip(&job.source_url)? {
        summary.skipped += 1;
        return Ok(());
    }

    let factory = Arc::clone(clients);
    let unit = job.clone();
    let result = task::spawn_blocking(move || copy_one(&*factory, &unit)).await?;

    match result {
        Ok(()) => {
            session.record_copied(&job.source_url, job.size);
            session.save()?;
            summary.copied += 1;
            debug!(source = %job.source_url, target = %job.target_url, "copied");
        }
        Err(e) => {
            warn!(source = %job.source_url, target = %job.target_url, error = %e, "copy failed");
            summary.failed.push(FailedJob {
                job,
                error: e.to_string(),
            });
        }
    }
    Ok(())
}

fn copy_one(clients: &dyn ClientFactory, job: &CopyJob) -> Result<(), ClientError> {
    let (stream, length) = get_source(clients, &job.source_url)?;
    put_target(clients, &job.target_url, length, stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ferry_client::{Client, Content, ContentKind, CopyShape, PlanEntry};
    use ferry_session::SessionStore;
    use std::collections::{HashMap, HashSet};
    use std::io::{Cursor, Read};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct MemBackend {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        fail_puts: HashSet<String>,
    }

    impl MemBackend {
        fn with_objects(objects: &[(&str, &[u8])]) -> Arc<Self> {
            Arc::new(Self {
                objects: Mutex::new(
                    objects
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_vec()))
                        .collect(),
                ),
                fail_puts: HashSet::new(),
            })
        }

        fn failing_put(mut self: Arc<Self>, url: &str) -> Arc<Self> {
            Arc::get_mut(&mut self)
                .unwrap()
                .fail_puts
                .insert(url.to_string());
            self
        }

        fn read(&self, url: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(url).cloned()
        }
    }

    struct MemClient {
        url: String,
        backend: Arc<MemBackend>,
    }

    impl Client for MemClient {
        fn get(&self) -> Result<(Box<dyn Read + Send>, u64), ClientError> {
            let data = self
                .backend
                .read(&self.url)
                .ok_or_else(|| ClientError::NotFound(self.url.clone()))?;
            let len = data.len() as u64;
            Ok((Box::new(Cursor::new(data)), len))
        }

        fn put(&self, length: u64, mut data: Box<dyn Read + Send>) -> Result<(), ClientError> {
            if self.backend.fail_puts.contains(&self.url) {
                return Err(ClientError::Backend {
                    url: self.url.clone(),
                    message: "simulated write failure".into(),
                });
            }
            let mut buf = Vec::with_capacity(length as usize);
            data.read_to_end(&mut buf)?;
            self.backend
                .objects
                .lock()
                .unwrap()
                .insert(self.url.clone(), buf);
            Ok(())
        }

        fn stat(&self) -> Result<Content, ClientError> {
            let data = self
                .backend
                .read(&self.url)
                .ok_or_else(|| ClientError::NotFound(self.url.clone()))?;
            Ok(Content {
                name: self.url.clone(),
                size: data.len() as u64,
                kind: ContentKind::File,
                modified: Utc::now(),
            })
        }
    }

    struct MemFactory(Arc<MemBackend>);

    impl ClientFactory for MemFactory {
        fn client_for(&self, url: &str) -> Result<Box<dyn Client>, ClientError> {
            if url.is_empty() {
                return Err(ClientError::InvalidUrl(url.into()));
            }
            Ok(Box::new(MemClient {
                url: url.to_string(),
                backend: Arc::clone(&self.0),
            }))
        }
    }

    /// Targets ending in `/` take the file's base name; `bad:` targets
    /// are unsupported.
    struct MemClassifier {
        backend: Arc<MemBackend>,
    }

    impl ShapeClassifier for MemClassifier {
        fn classify(&self, _sources: &[String], target_url: &str) -> CopyShape {
            if target_url.starts_with("bad:") {
                CopyShape::Unsupported
            } else if target_url.ends_with('/') {
                CopyShape::FileToDir
            } else {
                CopyShape::FileToFile
            }
        }

        fn prepare_single(&self, source_url: &str, target_url: &str) -> PlanEntry {
            let base = source_url.rsplit('/').next().unwrap_or(source_url);
            let target = if target_url.ends_with('/') {
                format!("{target_url}{base}")
            } else {
                target_url.to_string()
            };
            let size = self.backend.read(source_url).map_or(0, |d| d.len() as u64);
            Ok(CopyJob::new(source_url, target, size))
        }

        fn expand(
            &self,
            _source_url: &str,
            _target_url: &str,
        ) -> Box<dyn Iterator<Item = PlanEntry> + Send> {
            Box::new(std::iter::empty())
        }
    }

    fn session_with_command(store: &SessionStore, args: &[&str]) -> Arc<Session> {
        let session = store.create().unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        session.set_command("sync", &args);
        Arc::new(session)
    }

    #[tokio::test]
    async fn fresh_run_plans_logs_and_copies() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let backend = MemBackend::with_objects(&[("mem://src/f", b"hello")]);
        let session = session_with_command(&store, &["mem://src/f", "mem://d1/", "mem://d2/"]);

        let summary = run_sync(
            Arc::clone(&session),
            Arc::new(MemClassifier {
                backend: Arc::clone(&backend),
            }),
            Arc::new(MemFactory(Arc::clone(&backend))),
        )
        .await
        .unwrap();

        assert_eq!(summary.copied, 2);
        assert_eq!(summary.skipped, 0);
        assert!(summary.rejected.is_empty());
        assert!(summary.failed.is_empty());

        assert_eq!(backend.read("mem://d1/f").unwrap(), b"hello");
        assert_eq!(backend.read("mem://d2/f").unwrap(), b"hello");

        // Jobs landed in the data log, progress in the header.
        assert_eq!(session.logged_jobs().unwrap().len(), 2);
        let header = session.header();
        assert_eq!(header.total_objects, 2);
        assert_eq!(header.total_bytes, 10);
        assert_eq!(header.last_copied, "mem://src/f");
    }

    #[tokio::test]
    async fn rejected_target_is_reported_and_siblings_copy() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let backend = MemBackend::with_objects(&[("mem://src/f", b"data")]);
        let session = session_with_command(&store, &["mem://src/f", "bad:1", "mem://d2/"]);

        let summary = run_sync(
            session,
            Arc::new(MemClassifier {
                backend: Arc::clone(&backend),
            }),
            Arc::new(MemFactory(Arc::clone(&backend))),
        )
        .await
        .unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(backend.read("mem://d2/f").unwrap(), b"data");
    }

    #[tokio::test]
    async fn per_job_failure_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let backend =
            MemBackend::with_objects(&[("mem://src/f", b"data")]).failing_put("mem://d1/f");
        let session = session_with_command(&store, &["mem://src/f", "mem://d1/", "mem://d2/"]);

        let summary = run_sync(
            session,
            Arc::new(MemClassifier {
                backend: Arc::clone(&backend),
            }),
            Arc::new(MemFactory(Arc::clone(&backend))),
        )
        .await
        .unwrap();

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].job.target_url, "mem://d1/f");
        assert!(backend.read("mem://d1/f").is_none());
        assert_eq!(backend.read("mem://d2/f").unwrap(), b"data");
    }

    #[tokio::test]
    async fn resume_replays_log_and_skips_to_marker() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let backend = MemBackend::with_objects(&[("mem://src/s3", b"three")]);
        let session = session_with_command(&store, &["mem://src/s1", "mem://d/"]);

        // Simulate a prior run that planned three jobs and completed two.
        for n in 1..=3 {
            session
                .append_job(&CopyJob::new(
                    format!("mem://src/s{n}"),
                    format!("mem://d/s{n}"),
                    5,
                ))
                .unwrap();
        }
        session.record_copied("mem://src/s1", 5);
        session.record_copied("mem://src/s2", 5);
        session.save().unwrap();

        let summary = run_sync(
            Arc::clone(&session),
            Arc::new(MemClassifier {
                backend: Arc::clone(&backend),
            }),
            Arc::new(MemFactory(Arc::clone(&backend))),
        )
        .await
        .unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.copied, 1);
        assert_eq!(backend.read("mem://d/s3").unwrap(), b"three");
        // Only the freshly copied unit moved the counters.
        assert_eq!(session.header().total_objects, 3);
        assert_eq!(session.header().last_copied, "mem://src/s3");
    }

    #[tokio::test]
    async fn missing_command_args_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let backend = MemBackend::with_objects(&[]);
        let session = Arc::new(store.create().unwrap());

        let err = run_sync(
            session,
            Arc::new(MemClassifier {
                backend: Arc::clone(&backend),
            }),
            Arc::new(MemFactory(backend)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingArgs(_)));
    }
}

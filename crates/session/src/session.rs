//! One resumable session: lock-guarded header plus the data log.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use ferry_client::CopyJob;
use tracing::debug;

use crate::data_log::DataLog;
use crate::header::{BoolFlag, IntFlag, SessionHeader, SessionMessage, StringFlag};
use crate::SessionError;

/// A persisted, resumable record of one transfer command's progress.
///
/// The header and the data log's dirty flag are the only state shared
/// across task boundaries; both sit behind one internal lock, and the data
/// log's file handle is never touched except through these methods.
#[derive(Debug)]
pub struct Session {
    id: String,
    header_path: PathBuf,
    data_path: PathBuf,
    inner: Mutex<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    header: SessionHeader,
    log: DataLog,
}

impl Session {
    pub(crate) fn from_parts(
        id: String,
        header: SessionHeader,
        log: DataLog,
        header_path: PathBuf,
        data_path: PathBuf,
    ) -> Self {
        Self {
            id,
            header_path,
            data_path,
            inner: Mutex::new(SessionInner { header, log }),
        }
    }

    /// Returns the session ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns a snapshot of the header.
    pub fn header(&self) -> SessionHeader {
        self.inner.lock().unwrap().header.clone()
    }

    /// Returns `true` if this session has a resume cut point, i.e. at
    /// least one unit completed in a prior run.
    pub fn has_data(&self) -> bool {
        !self.inner.lock().unwrap().header.last_copied.is_empty()
    }

    /// Records the command this session belongs to.
    pub fn set_command(&self, command_type: &str, args: &[String]) {
        let mut inner = self.inner.lock().unwrap();
        inner.header.command_type = command_type.to_string();
        inner.header.command_args = args.to_vec();
    }

    /// Records the working directory the command was started from.
    pub fn set_root_path(&self, path: &str) {
        self.inner.lock().unwrap().header.root_path = path.to_string();
    }

    /// Appends a boolean option to the header's ordered flag list.
    pub fn add_bool_flag(&self, key: &str, value: bool) {
        self.inner.lock().unwrap().header.bool_flags.push(BoolFlag {
            key: key.to_string(),
            value,
        });
    }

    /// Appends an integer option to the header's ordered flag list.
    pub fn add_int_flag(&self, key: &str, value: i64) {
        self.inner.lock().unwrap().header.int_flags.push(IntFlag {
            key: key.to_string(),
            value,
        });
    }

    /// Appends a string option to the header's ordered flag list.
    pub fn add_string_flag(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .unwrap()
            .header
            .string_flags
            .push(StringFlag {
                key: key.to_string(),
                value: value.to_string(),
            });
    }

    /// Advances the resume cut point after one unit completed: sets
    /// `last_copied` and bumps the byte/object counters.
    pub fn record_copied(&self, source_url: &str, bytes: u64) {
        let mut inner = self.inner.lock().unwrap();
        inner.header.last_copied = source_url.to_string();
        inner.header.total_bytes += bytes as i64;
        inner.header.total_objects += 1;
    }

    /// Appends one planned job to the data log as a JSON line.
    pub fn append_job(&self, job: &CopyJob) -> Result<(), SessionError> {
        let line = serde_json::to_string(job).map_err(|e| SessionError::Encode {
            id: self.id.clone(),
            source: e,
        })?;
        self.inner
            .lock()
            .unwrap()
            .log
            .append_line(&line)
            .map_err(|e| self.with_id(e))
    }

    /// Reads all planned jobs back from the data log, in append order.
    /// Used on resume to replay previously queued work without re-running
    /// the planner.
    pub fn logged_jobs(&self) -> Result<Vec<CopyJob>, SessionError> {
        let lines = self
            .inner
            .lock()
            .unwrap()
            .log
            .read_lines()
            .map_err(|e| self.with_id(e))?;
        lines
            .iter()
            .map(|line| {
                serde_json::from_str(line).map_err(|e| SessionError::Decode {
                    id: self.id.clone(),
                    source: e,
                })
            })
            .collect()
    }

    /// Persists the session: flushes the data log if dirty, then writes
    /// the header file. Idempotent; callable any number of times between
    /// create and close.
    pub fn save(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.log.is_dirty() {
            inner.log.flush().map_err(|e| self.with_id(e))?;
        }
        self.persist_header(&inner.header)?;
        debug!(session = %self.id, "session saved");
        Ok(())
    }

    /// Ends this session, keeping its files on disk as a resumable
    /// checkpoint. Closes the data log (a second close fails) and writes
    /// the header one last time. Do not call `save` afterwards.
    pub fn close(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.close().map_err(|e| self.with_id(e))?;
        self.persist_header(&inner.header)?;
        debug!(session = %self.id, "session closed");
        Ok(())
    }

    /// Permanently removes this session's files. The data log is closed
    /// best-effort first (it may already be closed); removing a missing
    /// file is an error.
    pub fn delete(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().unwrap();
        let _ = inner.log.close();
        fs::remove_file(&self.data_path).map_err(|e| self.io_err(e))?;
        fs::remove_file(&self.header_path).map_err(|e| self.io_err(e))?;
        debug!(session = %self.id, "session deleted");
        Ok(())
    }

    /// Builds the machine-readable status record for this session.
    pub fn message(&self, status: &str) -> SessionMessage {
        let inner = self.inner.lock().unwrap();
        SessionMessage {
            status: status.to_string(),
            session_id: self.id.clone(),
            time: inner.header.when,
            command_type: inner.header.command_type.clone(),
            command_args: inner.header.command_args.clone(),
        }
    }

    fn persist_header(&self, header: &SessionHeader) -> Result<(), SessionError> {
        let bytes = serde_json::to_vec_pretty(header).map_err(|e| SessionError::Encode {
            id: self.id.clone(),
            source: e,
        })?;
        fs::write(&self.header_path, bytes).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    /// Tags a bare I/O error with this session's ID.
    fn io_err(&self, source: std::io::Error) -> SessionError {
        SessionError::SessionIo {
            id: self.id.clone(),
            source,
        }
    }

    fn with_id(&self, err: SessionError) -> SessionError {
        match err {
            SessionError::Io(e) => self.io_err(e),
            other => other,
        }
    }
}

impl fmt::Display for Session {
    /// Plain status line; colorizing is the rendering layer's concern.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        write!(
            f,
            "{} -> [{}] {} {}",
            self.id,
            inner.header.when.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            inner.header.command_type,
            inner.header.command_args.join(" ")
        )
    }
}

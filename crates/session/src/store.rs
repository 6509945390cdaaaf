//! On-disk session registry.
//!
//! Each session is two files under one directory: `<id>.session.json`
//! (the header) and `<id>.data` (the job log). The store knows the
//! directory; sessions themselves never do.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use uuid::Uuid;

use crate::data_log::DataLog;
use crate::header::SessionHeader;
use crate::session::Session;
use crate::{SESSION_VERSION, SessionError};

/// Length of a session ID: fixed, URL-safe hex.
const SESSION_ID_LEN: usize = 16;

const HEADER_SUFFIX: &str = ".session.json";
const DATA_SUFFIX: &str = ".data";

/// Creates, loads, enumerates and removes persisted sessions under one
/// directory.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the session directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the header file path for `id`.
    pub fn header_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{HEADER_SUFFIX}"))
    }

    /// Returns the data-log file path for `id`.
    pub fn data_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{DATA_SUFFIX}"))
    }

    /// Creates a fresh session: random ID, current-version header, empty
    /// data-log file on disk.
    ///
    /// Failure leaves no usable session behind; callers typically treat it
    /// as fatal.
    pub fn create(&self) -> Result<Session, SessionError> {
        let id = new_session_id();
        let data_path = self.data_path(&id);
        let log = DataLog::create(&data_path)?;
        info!(session = %id, "created session");
        Ok(Session::from_parts(
            id.clone(),
            SessionHeader::new(),
            log,
            self.header_path(&id),
            data_path,
        ))
    }

    /// Restores a session from its header and data-log files.
    ///
    /// Fails with `InvalidArgument` if the session directory does not
    /// exist, `NotFound` if there is no header for `id`, and `Decode` if
    /// the header does not parse. A session whose data log cannot be
    /// opened is unrecoverable — there is no partial-recovery path.
    pub fn load(&self, id: &str) -> Result<Session, SessionError> {
        if !self.dir.is_dir() {
            return Err(SessionError::InvalidArgument(format!(
                "session directory {} does not exist",
                self.dir.display()
            )));
        }

        let header_path = self.header_path(id);
        let bytes = match fs::read(&header_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let header: SessionHeader =
            serde_json::from_slice(&bytes).map_err(|e| SessionError::Decode {
                id: id.to_string(),
                source: e,
            })?;

        let data_path = self.data_path(id);
        let log = DataLog::open(&data_path)?;

        Ok(Session::from_parts(
            id.to_string(),
            header,
            log,
            header_path,
            data_path,
        ))
    }

    /// Enumerates the IDs of all sessions persisted in the directory,
    /// sorted for deterministic iteration.
    pub fn list_ids(&self) -> Result<Vec<String>, SessionError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(HEADER_SUFFIX) {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Removes both files of a session without loading it.
    pub fn remove_by_id(&self, id: &str) -> Result<(), SessionError> {
        fs::remove_file(self.data_path(id))?;
        fs::remove_file(self.header_path(id))?;
        Ok(())
    }

    /// Startup migration sweep: discards every session whose persisted
    /// version differs from [`SESSION_VERSION`]. No content is carried
    /// forward — a session is either fully current or fully gone before
    /// any other operation touches it.
    pub fn sweep_stale_versions(&self) -> Result<(), SessionError> {
        for id in self.list_ids()? {
            let bytes = fs::read(self.header_path(&id))?;
            let value: serde_json::Value =
                serde_json::from_slice(&bytes).map_err(|e| SessionError::Decode {
                    id: id.clone(),
                    source: e,
                })?;
            let version = value
                .get("version")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if version != SESSION_VERSION {
                warn!(session = %id, version, "discarding session with stale version");
                self.remove_by_id(&id)?;
            }
        }
        Ok(())
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()[..SESSION_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn session_ids_are_fixed_length_and_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert_eq!(a.len(), SESSION_ID_LEN);
        assert_eq!(b.len(), SESSION_ID_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn load_without_session_dir_is_invalid_argument() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("missing"));
        let err = store.load("whatever").unwrap_err();
        assert!(matches!(err, SessionError::InvalidArgument(_)));
    }

    #[test]
    fn load_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let err = store.load("0000000000000000").unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn load_corrupt_header_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        fs::write(store.header_path("bad0bad0bad0bad0"), b"{not json").unwrap();
        fs::write(store.data_path("bad0bad0bad0bad0"), b"").unwrap();

        let err = store.load("bad0bad0bad0bad0").unwrap_err();
        assert!(matches!(err, SessionError::Decode { .. }));
    }

    #[test]
    fn list_ids_returns_saved_sessions_sorted() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        let s1 = store.create().unwrap();
        s1.save().unwrap();
        let s2 = store.create().unwrap();
        s2.save().unwrap();

        let mut expected = vec![s1.id().to_string(), s2.id().to_string()];
        expected.sort();
        assert_eq!(store.list_ids().unwrap(), expected);
    }

    #[test]
    fn sweep_discards_stale_versions_and_keeps_current() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());

        let current = store.create().unwrap();
        current.save().unwrap();

        // Plant a stale session by hand.
        let stale_id = "5747a1e0ffee0001";
        let mut stale_header = SessionHeader::new();
        stale_header.version = "0".to_string();
        fs::write(
            store.header_path(stale_id),
            serde_json::to_vec_pretty(&stale_header).unwrap(),
        )
        .unwrap();
        fs::write(store.data_path(stale_id), b"old records\n").unwrap();

        store.sweep_stale_versions().unwrap();

        assert_eq!(store.list_ids().unwrap(), vec![current.id().to_string()]);
        assert!(!store.header_path(stale_id).exists());
        assert!(!store.data_path(stale_id).exists());
        // The current session's files are untouched.
        assert!(store.header_path(current.id()).exists());
        assert!(store.data_path(current.id()).exists());
    }

    #[test]
    fn remove_by_id_errors_on_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.remove_by_id("absent0000000000").is_err());
    }
}

//! Append handle over a session's data-log file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::SessionError;

/// Wraps the data-log file with a dirty flag.
///
/// Every append sets the flag; `flush` clears it only after a successful
/// sync to stable storage, so `save`/`close` can skip the flush when
/// nothing new was written since the last checkpoint.
#[derive(Debug)]
pub(crate) struct DataLog {
    file: Option<File>,
    dirty: bool,
    path: PathBuf,
}

impl DataLog {
    /// Creates a fresh, empty data-log file. The handle must be readable
    /// too: jobs are read back through it when the same session resumes
    /// in-process.
    pub(crate) fn create(path: &Path) -> Result<Self, SessionError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file: Some(file),
            dirty: false,
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing data-log file for read/write.
    pub(crate) fn open(path: &Path) -> Result<Self, SessionError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file: Some(file),
            dirty: false,
            path: path.to_path_buf(),
        })
    }

    /// Appends one record line and marks the log dirty.
    pub(crate) fn append_line(&mut self, line: &str) -> Result<(), SessionError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::End(0))?;
        writeln!(file, "{line}")?;
        self.dirty = true;
        Ok(())
    }

    /// Syncs appended records to stable storage and clears the dirty flag.
    pub(crate) fn flush(&mut self) -> Result<(), SessionError> {
        self.file_mut()?.sync_all()?;
        self.dirty = false;
        Ok(())
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Reads all record lines back from the start of the file.
    pub(crate) fn read_lines(&mut self) -> Result<Vec<String>, SessionError> {
        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(0))?;
        let mut lines = Vec::new();
        for line in BufReader::new(&*file).lines() {
            let line = line?;
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Syncs and drops the file handle. Closing twice is an error.
    pub(crate) fn close(&mut self) -> Result<(), SessionError> {
        match self.file.take() {
            Some(file) => {
                file.sync_all()?;
                Ok(())
            }
            None => Err(SessionError::LogClosed(self.path.display().to_string())),
        }
    }

    fn file_mut(&mut self) -> Result<&mut File, SessionError> {
        self.file
            .as_mut()
            .ok_or_else(|| SessionError::LogClosed(self.path.display().to_string()))
    }
}

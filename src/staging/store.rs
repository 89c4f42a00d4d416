//! On-disk staging area for voice samples.
//!
//! # Responsibilities
//! - Create the staging directory on first use
//! - Write uploads atomically (temp file + rename)
//! - Open staged files for streaming
//! - Evict files past their retention age
//!
//! # Design Decisions
//! - Flat layout: one directory, addressed only by filename
//! - Same-name writes race; the last rename wins and readers see either
//!   the old or the new file in full
//! - In-flight temp files are hidden names, which `validate_filename`
//!   never accepts, so they can't be requested or overwritten
//! - Eviction never touches in-flight temp files; an abandoned one is
//!   removed by its `PendingFile` when dropped

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::RelayError;
use crate::staging::filename::validate_filename;
use crate::staging::mime::content_type_for;

const TEMP_PREFIX: &str = ".upload-";
const TEMP_SUFFIX: &str = ".partial";

/// A file that has been written into the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub filename: String,
    pub size: u64,
    pub content_type: &'static str,
}

/// The staging directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start a new upload. Bytes go to a hidden temp file until
    /// [`PendingFile::commit`] names it.
    pub async fn begin(&self) -> Result<PendingFile, RelayError> {
        fs::create_dir_all(&self.root).await?;

        let temp_path = self.root.join(format!("{TEMP_PREFIX}{}{TEMP_SUFFIX}", Uuid::new_v4()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;

        Ok(PendingFile {
            file: Some(file),
            root: self.root.clone(),
            temp_path,
            written: 0,
            committed: false,
        })
    }

    /// Stage an already decoded payload under `filename`.
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> Result<StagedFile, RelayError> {
        validate_filename(filename).map_err(|e| RelayError::MalformedUpload(e.to_string()))?;

        let mut pending = self.begin().await?;
        pending.write_chunk(bytes).await?;
        pending.commit(filename).await
    }

    /// Open a staged file for reading.
    ///
    /// Unsafe names, missing files and directories are all `FileNotFound`.
    pub async fn open(&self, filename: &str) -> Result<(File, StagedFile), RelayError> {
        let name = validate_filename(filename).map_err(|e| {
            tracing::warn!(filename = %filename, reason = %e, "Rejected staged file lookup");
            RelayError::FileNotFound
        })?;
        let path = self.root.join(name);

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RelayError::FileNotFound),
            Err(e) => return Err(e.into()),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(RelayError::FileNotFound);
        }

        let staged = StagedFile {
            filename: name.to_string(),
            content_type: content_type_for(name),
            size: metadata.len(),
        };
        Ok((file, staged))
    }

    /// Remove files last modified more than `max_age` ago. Returns how
    /// many were removed. Uploads still being written are skipped.
    pub async fn evict_older_than(&self, max_age: Duration) -> io::Result<usize> {
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(0);
        };

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut evicted = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_temp_name(&entry.file_name()) {
                continue;
            }
            let modified = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata.modified()?,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable staged file");
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Evicted staged file");
                    evicted += 1;
                }
                // Overwritten or removed concurrently.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to evict staged file");
                }
            }
        }
        Ok(evicted)
    }
}

/// An upload being written. Dropping it without committing removes the
/// temp file.
#[derive(Debug)]
pub struct PendingFile {
    file: Option<File>,
    root: PathBuf,
    temp_path: PathBuf,
    written: u64,
    committed: bool,
}

impl PendingFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), RelayError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("pending file already closed"))?;
        file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Move the upload into place as `filename`, replacing any file of
    /// that name.
    pub async fn commit(mut self, filename: &str) -> Result<StagedFile, RelayError> {
        let name = validate_filename(filename).map_err(|e| RelayError::MalformedUpload(e.to_string()))?;

        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }

        let path = self.root.join(name);
        fs::rename(&self.temp_path, &path).await?;
        self.committed = true;

        Ok(StagedFile {
            filename: name.to_string(),
            content_type: content_type_for(name),
            size: self.written,
        })
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        self.file.take();
        let temp_path = std::mem::take(&mut self.temp_path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = fs::remove_file(&temp_path).await {
                        tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove abandoned upload");
                    }
                });
            }
            // Outside a runtime there is nothing to hand the unlink to.
            Err(_) => {
                let _ = std::fs::remove_file(&temp_path);
            }
        }
    }
}

fn is_temp_name(name: &OsStr) -> bool {
    name.to_str()
        .map(|n| n.starts_with(TEMP_PREFIX) && n.ends_with(TEMP_SUFFIX))
        .unwrap_or(false)
}

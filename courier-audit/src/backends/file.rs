use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::{
    AuditError,
    record::{AuditRecord, AuditRecordId},
    store::AuditStore,
};

/// File-backed audit store implementation
///
/// Appends one JSON document per line to a log file. JSON-lines keeps the
/// store greppable and allows external tooling to tail it without any courier
/// code.
///
/// Appends open the file per call rather than holding a handle, so the store
/// stays `Clone` and safe to share across overlapping publish calls; the
/// single-line write relies on the OS append-mode guarantee for atomicity at
/// this record size.
#[derive(Debug, Clone)]
pub struct FileAuditStore {
    path: PathBuf,
}

impl FileAuditStore {
    /// Open a file-backed store at `path`, creating parent directories
    ///
    /// # Errors
    /// If the parent directory cannot be created or is not a directory
    pub async fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            if parent.exists() && !parent.is_dir() {
                return Err(AuditError::Validation(format!(
                    "Audit store parent path is not a directory: {}",
                    parent.display()
                )));
            }
            tokio::fs::create_dir_all(parent).await?;
        }

        Ok(Self { path })
    }

    /// Path of the underlying log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn append(&self, record: AuditRecord) -> crate::Result<AuditRecordId> {
        let id = record.id.clone();

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(id)
    }
}

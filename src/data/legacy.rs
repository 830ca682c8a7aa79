//! Legacy flat-file cache
//!
//! A JSON array mirroring rows inserted into the local database. Write-only:
//! nothing reads it back on the request path.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::models::Podcast;
use crate::error::AppError;

pub struct LegacyCache {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl LegacyCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows currently mirrored; a missing file is an empty cache
    pub async fn load(&self) -> Result<Vec<Podcast>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    /// Append a row, replacing any previous copy with the same id
    pub async fn append(&self, podcast: &Podcast) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut rows = self.load().await?;
        rows.retain(|row| row.id != podcast.id);
        rows.push(podcast.clone());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        crate::maintenance::write_json_atomic(&self.path, &rows).await?;

        Ok(rows.len())
    }
}

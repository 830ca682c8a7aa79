//! Local filesystem storage
//!
//! Files land in the uploads directory under `<millis>-<random><ext>` and
//! are served from `/uploads/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;

use super::{AudioStorage, AudioUpload, StoredAudio};
use crate::error::AppError;

pub struct LocalAudioStorage {
    dir: PathBuf,
}

impl LocalAudioStorage {
    /// Create the storage, making sure the directory exists
    pub async fn new(dir: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Timestamp plus random suffix; uniqueness is probabilistic, no locking
    fn generate_name(extension: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{millis}-{suffix}{extension}")
    }

    /// Only plain file names are accepted, never paths
    fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|file_name| *file_name == std::ffi::OsStr::new(name))
            .ok_or_else(|| AppError::Validation(format!("Invalid stored file name: {name}")))?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl AudioStorage for LocalAudioStorage {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn store(&self, upload: &AudioUpload) -> Result<StoredAudio, AppError> {
        let name = Self::generate_name(&upload.extension());
        let path = self.dir.join(&name);

        tokio::fs::write(&path, &upload.data).await.map_err(|error| {
            AppError::Storage(format!("Failed to write {}: {}", path.display(), error))
        })?;

        tracing::debug!(file = %name, size = upload.data.len(), "Audio stored locally");
        Ok(StoredAudio {
            url: format!("/uploads/{name}"),
            name,
        })
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = %name, "Audio file already absent");
                Ok(())
            }
            Err(error) => Err(AppError::Storage(format!(
                "Failed to delete {}: {}",
                path.display(),
                error
            ))),
        }
    }
}

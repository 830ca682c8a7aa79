//! Podcast service
//!
//! Orchestrates the audio storage backend and the metadata store chain for
//! list, get, upload and delete.

use std::path::PathBuf;
use std::sync::Arc;

use super::side_effects::SideEffects;
use crate::data::{Database, LegacyCache, NewPodcast, Podcast, PodcastStore, StoreChain, Stored};
use crate::error::AppError;
use crate::metrics::{UPLOAD_BYTES_TOTAL, UPLOADS_TOTAL};
use crate::storage::{AudioStorage, AudioUpload};

/// Validated upload form
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub audio: AudioUpload,
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub podcast: Podcast,
    /// Name of the metadata store that accepted the row
    pub store: &'static str,
}

/// Tunables and optional collaborators
#[derive(Clone)]
pub struct PodcastServiceOptions {
    pub max_file_bytes: usize,
    /// Row-level backup written after each local insert
    pub rows_backup_path: Option<PathBuf>,
    /// Legacy JSON mirror written after each local insert
    pub legacy_cache: Option<Arc<LegacyCache>>,
}

/// Podcast service
pub struct PodcastService {
    stores: StoreChain,
    local: Arc<Database>,
    storage: Arc<dyn AudioStorage>,
    side_effects: SideEffects,
    options: PodcastServiceOptions,
}

impl PodcastService {
    /// Create new podcast service
    ///
    /// `stores` must end with `local`, the store of last resort.
    pub fn new(
        stores: StoreChain,
        local: Arc<Database>,
        storage: Arc<dyn AudioStorage>,
        side_effects: SideEffects,
        options: PodcastServiceOptions,
    ) -> Self {
        Self {
            stores,
            local,
            storage,
            side_effects,
            options,
        }
    }

    pub fn stores(&self) -> &StoreChain {
        &self.stores
    }

    pub fn storage_kind(&self) -> &'static str {
        self.storage.kind()
    }

    pub fn max_file_bytes(&self) -> usize {
        self.options.max_file_bytes
    }

    /// All podcasts from the highest-priority store that answers
    pub async fn list(&self) -> Result<Vec<Podcast>, AppError> {
        self.stores.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Podcast, AppError> {
        Ok(self.stores.get(id).await?.podcast)
    }

    /// Share pages only ever read the local database
    pub async fn get_local(&self, id: i64) -> Result<Option<Podcast>, AppError> {
        self.local.get_podcast(id).await
    }

    /// Check the parts of an upload that must hold before anything is stored
    pub fn validate_upload(&self, request: &UploadRequest) -> Result<(), AppError> {
        validate_audio_content_type(&request.audio.content_type)?;
        if request.audio.data.len() > self.options.max_file_bytes {
            return Err(AppError::Validation(format!(
                "File too large: exceeds {} bytes",
                self.options.max_file_bytes
            )));
        }
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Please provide a podcast title".to_string()));
        }
        Ok(())
    }

    /// Store the audio once, then its metadata in the first store that
    /// accepts it.
    ///
    /// # Steps
    /// 1. Validate content type, size and title
    /// 2. Persist the binary through the selected storage backend
    /// 3. Insert metadata through the store chain
    /// 4. After a local insert, mirror and back up in the background
    ///
    /// A metadata failure after step 2 leaves the binary orphaned.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, AppError> {
        self.validate_upload(&request)?;

        let stored_audio = self.storage.store(&request.audio).await?;
        if stored_audio.name.trim().is_empty() {
            return Err(AppError::Validation(
                "Could not determine the stored file name".to_string(),
            ));
        }

        UPLOADS_TOTAL
            .with_label_values(&[self.storage.kind()])
            .inc();
        UPLOAD_BYTES_TOTAL.inc_by(request.audio.data.len() as f64);

        let new_podcast = NewPodcast {
            title: request.title.trim().to_string(),
            description: request.description,
            filename: stored_audio.name.clone(),
            originalname: request.audio.original_name,
            filesize: request.audio.data.len() as i64,
            file_url: stored_audio.url,
        };

        let Stored { podcast, store } = match self.stores.insert(&new_podcast).await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::error!(
                    file = %stored_audio.name,
                    %error,
                    "Metadata insert failed; stored audio is orphaned"
                );
                return Err(error);
            }
        };

        if store == self.local.name() {
            self.after_local_insert(&podcast);
        }

        tracing::info!(id = podcast.id, store, file = %podcast.filename, "Podcast uploaded");
        Ok(UploadOutcome { podcast, store })
    }

    fn after_local_insert(&self, podcast: &Podcast) {
        if let Some(cache) = &self.options.legacy_cache {
            let cache = cache.clone();
            let podcast = podcast.clone();
            self.side_effects.spawn("legacy_mirror", async move {
                cache.append(&podcast).await.map(|_| ())
            });
        }

        if let Some(path) = &self.options.rows_backup_path {
            let db = self.local.clone();
            let path = path.clone();
            self.side_effects.spawn("rows_backup", async move {
                crate::maintenance::export_rows(&db, &path).await.map(|_| ())
            });
        }
    }

    /// Delete a podcast and its audio file.
    ///
    /// Idempotent stores (remote) report success whether or not the row
    /// existed, and their audio cleanup runs in the background. Other stores
    /// (local) return `NotFound` for a missing row.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let stores = self.stores.stores();

        for (index, store) in stores.iter().enumerate() {
            let is_last = index + 1 == stores.len();

            if store.idempotent_delete() {
                let filename = match store.get(id).await {
                    Ok(row) => row.map(|row| row.filename),
                    Err(error) => {
                        tracing::warn!(store = store.name(), id, %error, "Lookup before delete failed");
                        None
                    }
                };

                match store.delete(id).await {
                    Ok(_) => {
                        if let Some(filename) = filename {
                            let storage = self.storage.clone();
                            self.side_effects.spawn("audio_delete", async move {
                                storage.delete(&filename).await
                            });
                        }
                        tracing::info!(store = store.name(), id, "Podcast deleted");
                        return Ok(());
                    }
                    Err(error) if !is_last => {
                        tracing::warn!(store = store.name(), id, %error, "Delete failed, trying next store");
                    }
                    Err(error) => return Err(error),
                }
                continue;
            }

            let existing = match store.get(id).await {
                Ok(Some(existing)) => existing,
                Ok(None) if !is_last => continue,
                Ok(None) => return Err(AppError::NotFound),
                Err(error) if !is_last => {
                    tracing::warn!(store = store.name(), id, %error, "Lookup failed, trying next store");
                    continue;
                }
                Err(error) => return Err(error),
            };

            if let Err(error) = self.storage.delete(&existing.filename).await {
                tracing::warn!(file = %existing.filename, %error, "Failed to delete audio file");
            }
            store.delete(id).await?;
            tracing::info!(store = store.name(), id, "Podcast deleted");
            return Ok(());
        }

        Err(AppError::NotFound)
    }
}

/// Only `audio/*` uploads are accepted
pub fn validate_audio_content_type(content_type: &str) -> Result<(), AppError> {
    if content_type.trim().to_ascii_lowercase().starts_with("audio/") {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Only audio files can be uploaded".to_string(),
        ))
    }
}

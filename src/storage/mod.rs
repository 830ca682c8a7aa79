//! Audio file storage
//!
//! Handles:
//! - Local uploads directory
//! - S3-compatible object storage
//! - Startup-time selection between the two

mod local;
mod object;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalAudioStorage;
pub use object::{ObjectAudioStorage, ObjectSummary};

use crate::config::ObjectStorageConfig;
use crate::error::AppError;

/// An uploaded audio file waiting to be persisted
#[derive(Debug, Clone)]
pub struct AudioUpload {
    /// File name supplied by the client
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl AudioUpload {
    /// Extension of the original file name, with its leading dot
    pub fn extension(&self) -> String {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default()
    }
}

/// Where an upload ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    /// Local generated file name or object key
    pub name: String,
    /// URL an `<audio>` element can play directly
    pub url: String,
}

/// Uniform "receive a file, return (name, URL)" contract
#[async_trait]
pub trait AudioStorage: Send + Sync {
    /// Backend label for logs and metrics
    fn kind(&self) -> &'static str;

    async fn store(&self, upload: &AudioUpload) -> Result<StoredAudio, AppError>;

    /// Remove a stored file; an already-absent file is not an error
    async fn delete(&self, name: &str) -> Result<(), AppError>;
}

/// Pick the audio storage backend at startup.
///
/// Object storage is used only when enabled and fully configured; an enabled
/// but incomplete configuration falls back to the uploads directory.
pub async fn select_audio_storage(
    config: &ObjectStorageConfig,
    uploads_dir: &Path,
) -> Result<Arc<dyn AudioStorage>, AppError> {
    if config.enabled {
        if config.credentials_complete() {
            let storage = ObjectAudioStorage::new(config)?;
            tracing::info!(
                bucket = %storage.bucket(),
                folder = %config.folder,
                "Using object storage for audio uploads"
            );
            return Ok(Arc::new(storage));
        }

        tracing::warn!(
            missing = ?config.missing_credentials(),
            "Object storage enabled but not fully configured"
        );
    }

    let storage = LocalAudioStorage::new(uploads_dir).await?;
    tracing::info!(dir = %uploads_dir.display(), "Using local storage for audio uploads");
    Ok(Arc::new(storage))
}

pub(crate) fn build_s3_http_client() -> aws_sdk_s3::config::SharedHttpClient {
    use aws_smithy_runtime::client::http::hyper_014::HyperClientBuilder;

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();

    HyperClientBuilder::new().build(https_connector)
}

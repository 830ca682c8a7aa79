//! Object storage using an S3-compatible bucket
//!
//! Handles upload, delete, and URL generation for audio files.
//! Files are served from the configured public URL (bucket custom domain or CDN).

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use super::{AudioStorage, AudioUpload, StoredAudio, build_s3_http_client};
use crate::config::ObjectStorageConfig;
use crate::error::AppError;

/// Object metadata key carrying the resource classification
const RESOURCE_TYPE_METADATA: &str = "resource-type";

/// Audio storage backed by an S3-compatible bucket
pub struct ObjectAudioStorage {
    /// S3-compatible client
    client: S3Client,
    bucket: String,
    /// Public URL base, e.g. "https://media.example.com"
    public_url: String,
    /// Key prefix for uploads
    folder: String,
    /// Accepted extensions (lowercase, no dot)
    allowed_formats: Vec<String>,
    /// Recorded as object metadata; audio is classified as "video"
    resource_type: String,
}

/// Entry returned by [`ObjectAudioStorage::list_recent`]
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    pub key: String,
    pub url: String,
    pub size: Option<i64>,
}

impl ObjectAudioStorage {
    /// Create new object storage client
    ///
    /// # Errors
    /// Returns `AppError::Config` when a required setting is missing
    pub fn new(config: &ObjectStorageConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let required = |value: &Option<String>, name: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AppError::Config(format!("{name} is required for object storage")))
        };

        let endpoint = required(&config.endpoint, "object_storage.endpoint")?;
        let bucket = required(&config.bucket, "object_storage.bucket")?;
        let access_key_id = required(&config.access_key_id, "object_storage.access_key_id")?;
        let secret_access_key =
            required(&config.secret_access_key, "object_storage.secret_access_key")?;
        let public_url = required(&config.public_url, "object_storage.public_url")?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "podshare-object-storage",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .http_client(build_s3_http_client())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
            folder: config.folder.trim_matches('/').to_string(),
            allowed_formats: config.allowed_formats(),
            resource_type: config.resource_type.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get public URL for an object key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    /// Object key for a new upload: `<folder>/<ULID>.<ext>`
    fn object_key(&self, extension: &str) -> String {
        let id = ulid::Ulid::new().to_string().to_ascii_lowercase();
        if self.folder.is_empty() {
            format!("{id}{extension}")
        } else {
            format!("{}/{}{}", self.folder, id, extension)
        }
    }

    fn check_format(&self, upload: &AudioUpload) -> Result<String, AppError> {
        let extension = upload.extension().to_ascii_lowercase();
        let format = extension.trim_start_matches('.');
        if self.allowed_formats.iter().any(|allowed| allowed == format) {
            Ok(extension)
        } else {
            Err(AppError::Validation(format!(
                "Unsupported audio format: {} (allowed: {})",
                if format.is_empty() { "none" } else { format },
                self.allowed_formats.join(", ")
            )))
        }
    }

    /// Connectivity check against the bucket
    pub async fn ping(&self) -> Result<(), AppError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Object storage ping failed: {}", e)))?;

        Ok(())
    }

    /// Up to `limit` objects under the upload folder
    pub async fn list_recent(&self, limit: i32) -> Result<Vec<ObjectSummary>, AppError> {
        let prefix = if self.folder.is_empty() {
            String::new()
        } else {
            format!("{}/", self.folder)
        };

        let result = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(limit)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to list objects: {}", e)))?;

        Ok(result
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let key = object.key?;
                Some(ObjectSummary {
                    url: self.get_public_url(&key),
                    size: object.size,
                    key,
                })
            })
            .collect())
    }
}

#[async_trait]
impl AudioStorage for ObjectAudioStorage {
    fn kind(&self) -> &'static str {
        "object"
    }

    async fn store(&self, upload: &AudioUpload) -> Result<StoredAudio, AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        let extension = self.check_format(upload)?;
        let key = self.object_key(&extension);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.data.clone()))
            .content_type(&upload.content_type)
            .metadata(RESOURCE_TYPE_METADATA, &self.resource_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Object upload failed: {}", e)))?;

        tracing::debug!(key = %key, size = upload.data.len(), "Audio stored in object storage");
        Ok(StoredAudio {
            url: self.get_public_url(&key),
            name: key,
        })
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        // S3 DeleteObject succeeds for absent keys
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Object delete failed: {}", e)))?;

        Ok(())
    }
}

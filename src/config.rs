//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub remote_db: RemoteDatabaseConfig,
    pub object_storage: ObjectStorageConfig,
    pub legacy_cache: LegacyCacheConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
    /// "production" or "development"
    pub environment: String,
    /// Public base URL used for share links (e.g., "https://pods.example.com")
    pub public_url: Option<String>,
    /// Front-end build directory served for unmatched routes
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Data directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Explicit data directory, wins over the environment-based default
    pub dir: Option<PathBuf>,
    /// Data directory used in production when `dir` is unset
    pub production_dir: PathBuf,
}

/// Upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted audio file size in bytes (default: 100 MiB)
    pub max_file_bytes: usize,
}

/// Remote managed database (PostgREST) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDatabaseConfig {
    /// Base URL, e.g. "https://abc.supabase.co"
    pub url: Option<String>,
    /// Service role key (preferred)
    pub service_role_key: Option<String>,
    /// Anonymous key, used when no service role key is set
    pub anon_key: Option<String>,
    /// Table holding podcast rows
    #[serde(default = "default_remote_table")]
    pub table: String,
}

impl Default for RemoteDatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            anon_key: None,
            table: default_remote_table(),
        }
    }
}

fn default_remote_table() -> String {
    "podcasts".to_string()
}

impl RemoteDatabaseConfig {
    /// URL and API key, if both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = non_empty(self.url.as_deref())?;
        let key = non_empty(self.service_role_key.as_deref())
            .or_else(|| non_empty(self.anon_key.as_deref()))?;
        Some((url, key))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

/// Object storage (S3-compatible) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorageConfig {
    /// Store uploads in object storage instead of the local uploads directory
    pub enabled: bool,
    /// S3 endpoint, e.g. "https://<account>.r2.cloudflarestorage.com"
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Public URL base for stored objects
    pub public_url: Option<String>,
    /// Key prefix for uploaded audio
    pub folder: String,
    /// Comma-separated list of accepted file extensions
    pub allowed_formats: String,
    /// Resource classification recorded on each object
    pub resource_type: String,
    #[serde(default)]
    pub force_path_style: bool,
}

impl ObjectStorageConfig {
    /// Accepted extensions, lowercased, without leading dots
    pub fn allowed_formats(&self) -> Vec<String> {
        self.allowed_formats
            .split(',')
            .map(|format| format.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|format| !format.is_empty())
            .collect()
    }

    /// Names of required settings that are missing
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("object_storage.endpoint", &self.endpoint),
            ("object_storage.bucket", &self.bucket),
            ("object_storage.access_key_id", &self.access_key_id),
            ("object_storage.secret_access_key", &self.secret_access_key),
            ("object_storage.public_url", &self.public_url),
        ]
        .into_iter()
        .filter(|(_, value)| non_empty(value.as_deref()).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn credentials_complete(&self) -> bool {
        self.missing_credentials().is_empty()
    }
}

/// Legacy flat-file mirror configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyCacheConfig {
    /// Mirror inserted rows into a JSON file (dormant by default)
    pub enabled: bool,
    /// File name inside the data directory
    pub file_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> String {
        format!("podshare={},tower_http=debug", self.level.trim())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Resolved on-disk layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub db_path: PathBuf,
    pub rows_backup_path: PathBuf,
}

impl DataPaths {
    pub const DB_FILE: &'static str = "podcast.db";
    pub const UPLOADS_DIR: &'static str = "uploads";
    pub const ROWS_BACKUP_FILE: &'static str = "podcasts-backup.json";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            uploads_dir: data_dir.join(Self::UPLOADS_DIR),
            db_path: data_dir.join(Self::DB_FILE),
            rows_backup_path: data_dir.join(Self::ROWS_BACKUP_FILE),
            data_dir,
        }
    }

    pub fn legacy_cache_path(&self, config: &LegacyCacheConfig) -> PathBuf {
        self.data_dir.join(&config.file_name)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (PODSHARE__*)
    /// 5. `PORT`, as set by most hosting platforms
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.environment", "development")?
            .set_default("data.production_dir", "/opt/render/project/src/data")?
            .set_default("upload.max_file_bytes", 100 * 1024 * 1024)?
            .set_default("remote_db.table", "podcasts")?
            .set_default("object_storage.enabled", false)?
            .set_default("object_storage.region", "auto")?
            .set_default("object_storage.folder", "podcast-uploads")?
            .set_default("object_storage.allowed_formats", "mp3,wav,m4a,aac,ogg,flac")?
            .set_default("object_storage.resource_type", "video")?
            .set_default("object_storage.force_path_style", false)?
            .set_default("legacy_cache.enabled", false)?
            .set_default("legacy_cache.file_name", "podcasts-data.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (PODSHARE__*)
            .add_source(
                Environment::with_prefix("PODSHARE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Data directory: explicit `data.dir`, else the production or local default
    pub fn data_paths(&self) -> DataPaths {
        let data_dir = match &self.data.dir {
            Some(dir) => dir.clone(),
            None if self.server.is_production() => self.data.production_dir.clone(),
            None => PathBuf::from("./data"),
        };
        DataPaths::new(data_dir)
    }

    pub fn legacy_cache_path(&self) -> Option<PathBuf> {
        self.legacy_cache
            .enabled
            .then(|| self.data_paths().legacy_cache_path(&self.legacy_cache))
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.upload.max_file_bytes == 0 {
            return Err(crate::error::AppError::Config(
                "upload.max_file_bytes must be greater than 0".to_string(),
            ));
        }

        let environment = self.server.environment.to_ascii_lowercase();
        if environment != "production" && environment != "development" {
            return Err(crate::error::AppError::Config(format!(
                "server.environment must be production or development, got {}",
                self.server.environment
            )));
        }

        if self.object_storage.resource_type.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "object_storage.resource_type must not be empty".to_string(),
            ));
        }

        for (name, value) in [
            ("server.public_url", self.server.public_url.as_deref()),
            ("remote_db.url", self.remote_db.url.as_deref()),
            ("object_storage.endpoint", self.object_storage.endpoint.as_deref()),
            ("object_storage.public_url", self.object_storage.public_url.as_deref()),
        ] {
            if let Some(value) = non_empty(value) {
                url::Url::parse(value).map_err(|e| {
                    crate::error::AppError::Config(format!("{name} is not a valid URL: {e}"))
                })?;
            }
        }

        if self.object_storage.enabled && !self.object_storage.credentials_complete() {
            tracing::warn!(
                missing = ?self.object_storage.missing_credentials(),
                "Object storage enabled without complete credentials; local storage will be used"
            );
        }

        Ok(())
    }
}

impl Default for AppConfig {
    /// Development defaults rooted at `./data` with every optional backend disabled
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                environment: "development".to_string(),
                public_url: None,
                static_dir: None,
            },
            data: DataConfig {
                dir: None,
                production_dir: PathBuf::from("/opt/render/project/src/data"),
            },
            upload: UploadConfig {
                max_file_bytes: 100 * 1024 * 1024,
            },
            remote_db: RemoteDatabaseConfig::default(),
            object_storage: ObjectStorageConfig {
                enabled: false,
                endpoint: None,
                region: "auto".to_string(),
                bucket: None,
                access_key_id: None,
                secret_access_key: None,
                public_url: None,
                folder: "podcast-uploads".to_string(),
                allowed_formats: "mp3,wav,m4a,aac,ogg,flac".to_string(),
                resource_type: "video".to_string(),
                force_path_style: false,
            },
            legacy_cache: LegacyCacheConfig {
                enabled: false,
                file_name: "podcasts-data.json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Default configuration with the data directory pinned to `dir`
    pub fn with_data_dir(dir: &Path) -> Self {
        let mut config = Self::default();
        config.data.dir = Some(dir.to_path_buf());
        config
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

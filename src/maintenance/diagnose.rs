//! Configuration diagnostics and the object storage connectivity check
//!
//! Secret values are never included in a report; only whether they are set.

use std::fmt;

use crate::config::{AppConfig, DataPaths};
use crate::error::AppError;
use crate::storage::{ObjectAudioStorage, ObjectSummary};

/// Snapshot of how the server would wire itself with `config`
#[derive(Debug, Clone)]
pub struct DiagnosticReport {
    pub environment: String,
    pub production: bool,
    pub paths: DataPaths,
    pub remote_configured: bool,
    pub object_storage_enabled: bool,
    /// `(setting, is_set)` for every required object storage setting
    pub object_storage_settings: Vec<(&'static str, bool)>,
    pub selected_storage: &'static str,
    pub selection_reason: String,
    pub legacy_cache: Option<std::path::PathBuf>,
}

/// Result of [`check_object_storage`]
#[derive(Debug, Clone)]
pub struct StorageCheck {
    pub bucket: String,
    pub objects: Vec<ObjectSummary>,
}

const OBJECT_STORAGE_SETTINGS: [&str; 5] = [
    "object_storage.endpoint",
    "object_storage.bucket",
    "object_storage.access_key_id",
    "object_storage.secret_access_key",
    "object_storage.public_url",
];

/// Objects listed by [`check_object_storage`]
const STORAGE_CHECK_LIMIT: i32 = 10;

pub fn diagnose(config: &AppConfig) -> DiagnosticReport {
    let object_storage = &config.object_storage;
    let missing = object_storage.missing_credentials();
    let object_storage_settings = OBJECT_STORAGE_SETTINGS
        .iter()
        .map(|setting| (*setting, !missing.contains(setting)))
        .collect();

    let (selected_storage, selection_reason) = if !object_storage.enabled {
        ("local", "object storage disabled".to_string())
    } else if missing.is_empty() {
        ("object", "object storage enabled and fully configured".to_string())
    } else {
        (
            "local",
            format!(
                "object storage enabled but missing {}",
                missing.join(", ")
            ),
        )
    };

    DiagnosticReport {
        environment: config.server.environment.clone(),
        production: config.server.is_production(),
        paths: config.data_paths(),
        remote_configured: config.remote_db.is_configured(),
        object_storage_enabled: object_storage.enabled,
        object_storage_settings,
        selected_storage,
        selection_reason,
        legacy_cache: config.legacy_cache_path(),
    }
}

/// Probe the bucket and list a few objects under the upload folder
pub async fn check_object_storage(config: &AppConfig) -> Result<StorageCheck, AppError> {
    let storage = ObjectAudioStorage::new(&config.object_storage)?;
    storage.ping().await?;
    let objects = storage.list_recent(STORAGE_CHECK_LIMIT).await?;

    tracing::info!(bucket = %storage.bucket(), objects = objects.len(), "Object storage reachable");
    Ok(StorageCheck {
        bucket: storage.bucket().to_string(),
        objects,
    })
}

fn set_or_missing(set: bool) -> &'static str {
    if set { "set" } else { "missing" }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "environment: {} (production: {})", self.environment, self.production)?;
        writeln!(f, "data dir: {}", self.paths.data_dir.display())?;
        writeln!(f, "database: {}", self.paths.db_path.display())?;
        writeln!(f, "uploads dir: {}", self.paths.uploads_dir.display())?;
        writeln!(f, "rows backup: {}", self.paths.rows_backup_path.display())?;
        writeln!(
            f,
            "remote database: {}",
            if self.remote_configured { "configured" } else { "not configured" }
        )?;
        match &self.legacy_cache {
            Some(path) => writeln!(f, "legacy cache: {}", path.display())?,
            None => writeln!(f, "legacy cache: disabled")?,
        }
        writeln!(f, "object storage enabled: {}", self.object_storage_enabled)?;
        for (setting, set) in &self.object_storage_settings {
            writeln!(f, "  {}: {}", setting, set_or_missing(*set))?;
        }
        write!(
            f,
            "audio storage: {} ({})",
            self.selected_storage, self.selection_reason
        )
    }
}

impl fmt::Display for StorageCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bucket {} reachable", self.bucket)?;
        if self.objects.is_empty() {
            return write!(f, "no objects under the upload folder");
        }
        for object in &self.objects {
            writeln!(f, "  {} -> {}", object.key, object.url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_local_storage() {
        let report = diagnose(&AppConfig::default());

        assert_eq!(report.selected_storage, "local");
        assert_eq!(report.selection_reason, "object storage disabled");
        assert!(!report.remote_configured);
        assert!(report.legacy_cache.is_none());
    }

    #[test]
    fn incomplete_object_storage_names_missing_settings() {
        let mut config = AppConfig::default();
        config.object_storage.enabled = true;
        config.object_storage.endpoint = Some("https://s3.example.com".to_string());
        config.object_storage.secret_access_key = Some("super-secret".to_string());

        let report = diagnose(&config);
        assert_eq!(report.selected_storage, "local");
        assert!(report.selection_reason.contains("object_storage.bucket"));
        assert!(report
            .object_storage_settings
            .contains(&("object_storage.secret_access_key", true)));

        let rendered = report.to_string();
        assert!(rendered.contains("object_storage.bucket: missing"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn complete_object_storage_is_selected() {
        let mut config = AppConfig::default();
        let storage = &mut config.object_storage;
        storage.enabled = true;
        storage.endpoint = Some("https://s3.example.com".to_string());
        storage.bucket = Some("pods".to_string());
        storage.access_key_id = Some("key".to_string());
        storage.secret_access_key = Some("secret".to_string());
        storage.public_url = Some("https://cdn.example.com".to_string());

        assert_eq!(diagnose(&config).selected_storage, "object");
    }
}

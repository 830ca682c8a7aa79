//! Maintenance utilities
//!
//! Standalone procedures over the data directory and the local database,
//! driven by the `podshare-admin` binary. All of them are safe to re-run;
//! missing source data is a no-op rather than an error.

mod diagnose;
mod files;
mod rows;

use std::path::Path;

use serde::Serialize;

pub use diagnose::{DiagnosticReport, StorageCheck, check_object_storage, diagnose};
pub use files::{
    BackupReport, InitReport, MigrateReport, RestoreFilesReport, backup_files, init_data,
    migrate_legacy_layout, restore_files,
};
pub use rows::{RowsRestoreReport, export_rows, import_rows};

use crate::error::AppError;

/// Write pretty JSON through a sibling temp file and rename it into place
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("backup.json");
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, ulid::Ulid::new()));

    tokio::fs::write(&temp_path, json).await?;
    if let Err(error) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error.into());
    }

    Ok(())
}

//! File-level maintenance: init, backup, restore, and legacy layout migration
//!
//! Backups mirror the data directory layout:
//!
//! ```text
//! <backup_dir>/podcast.db
//! <backup_dir>/uploads/...
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::DataPaths;
use crate::data::Database;
use crate::error::AppError;

/// Placeholder kept in empty upload directories under version control
const PLACEHOLDER_FILE: &str = ".gitkeep";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Whether the database file was absent and has been created
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub backup_dir: PathBuf,
    pub database_copied: bool,
    pub files_copied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFilesReport {
    pub database_restored: bool,
    pub files_restored: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateReport {
    pub database_copied: bool,
    pub files_copied: usize,
}

impl MigrateReport {
    pub fn is_empty(&self) -> bool {
        !self.database_copied && self.files_copied == 0
    }
}

/// Ensure the data layout exists and the database carries its table
pub async fn init_data(paths: &DataPaths) -> Result<InitReport, AppError> {
    tokio::fs::create_dir_all(&paths.uploads_dir).await?;

    let created = !tokio::fs::try_exists(&paths.db_path).await?;
    let db = Database::connect(&paths.db_path).await?;
    db.close().await;

    if created {
        tracing::info!(path = %paths.db_path.display(), "Database created");
    } else {
        tracing::info!(path = %paths.db_path.display(), "Database already present");
    }
    Ok(InitReport { created })
}

/// Copy the database and uploads into `backup_dir`, replacing earlier copies
pub async fn backup_files(paths: &DataPaths, backup_dir: &Path) -> Result<BackupReport, AppError> {
    tokio::fs::create_dir_all(backup_dir).await?;

    let database_copied = if tokio::fs::try_exists(&paths.db_path).await? {
        let db = Database::connect(&paths.db_path).await?;
        let snapshot = db.snapshot_to(&backup_dir.join(DataPaths::DB_FILE)).await;
        db.close().await;
        snapshot?;
        true
    } else {
        tracing::info!(path = %paths.db_path.display(), "No database to back up");
        false
    };

    let files_copied = copy_tree_blocking(
        paths.uploads_dir.clone(),
        backup_dir.join(DataPaths::UPLOADS_DIR),
    )
    .await?;

    tracing::info!(
        backup_dir = %backup_dir.display(),
        database_copied,
        files_copied,
        "Backup completed"
    );
    Ok(BackupReport {
        backup_dir: backup_dir.to_path_buf(),
        database_copied,
        files_copied,
    })
}

/// Copy a backup made by [`backup_files`] back into the data directory.
///
/// # Errors
/// Fails when `backup_dir` does not exist.
pub async fn restore_files(
    paths: &DataPaths,
    backup_dir: &Path,
) -> Result<RestoreFilesReport, AppError> {
    if !tokio::fs::try_exists(backup_dir).await? {
        return Err(AppError::Validation(format!(
            "Backup directory not found: {}",
            backup_dir.display()
        )));
    }

    tokio::fs::create_dir_all(&paths.uploads_dir).await?;

    let backup_db = backup_dir.join(DataPaths::DB_FILE);
    let database_restored = tokio::fs::try_exists(&backup_db).await?;
    if database_restored {
        remove_sqlite_sidecars(&paths.db_path).await?;
        tokio::fs::copy(&backup_db, &paths.db_path).await?;
    }

    let files_restored = copy_tree_blocking(
        backup_dir.join(DataPaths::UPLOADS_DIR),
        paths.uploads_dir.clone(),
    )
    .await?;

    tracing::info!(database_restored, files_restored, "Restore completed");
    Ok(RestoreFilesReport {
        database_restored,
        files_restored,
    })
}

/// Move a top-level `podcast.db` and `uploads/` into the data directory
pub async fn migrate_legacy_layout(
    legacy_root: &Path,
    paths: &DataPaths,
) -> Result<MigrateReport, AppError> {
    tokio::fs::create_dir_all(&paths.uploads_dir).await?;

    let legacy_db = legacy_root.join(DataPaths::DB_FILE);
    let database_copied =
        tokio::fs::try_exists(&legacy_db).await? && !same_file(&legacy_db, &paths.db_path);
    if database_copied {
        remove_sqlite_sidecars(&paths.db_path).await?;
        tokio::fs::copy(&legacy_db, &paths.db_path).await?;
    }

    let legacy_uploads = legacy_root.join(DataPaths::UPLOADS_DIR);
    let files_copied = if same_file(&legacy_uploads, &paths.uploads_dir) {
        0
    } else {
        copy_tree_blocking(legacy_uploads, paths.uploads_dir.clone()).await?
    };

    let report = MigrateReport {
        database_copied,
        files_copied,
    };
    if report.is_empty() {
        tracing::info!(legacy_root = %legacy_root.display(), "Nothing to migrate");
    } else {
        tracing::info!(database_copied, files_copied, "Migration completed");
    }
    Ok(report)
}

/// Delete `-wal` and `-shm` files so SQLite cannot replay them onto a replaced database
async fn remove_sqlite_sidecars(db_path: &Path) -> Result<(), AppError> {
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        match tokio::fs::remove_file(&sidecar).await {
            Ok(()) => {
                tracing::info!(path = %Path::new(&sidecar).display(), "Removed stale SQLite sidecar")
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn copy_tree_blocking(source: PathBuf, target: PathBuf) -> Result<usize, AppError> {
    tokio::task::spawn_blocking(move || copy_tree(&source, &target))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("copy task failed: {}", e)))?
}

/// Recursively copy `source` into `target`, returning the number of files.
/// A missing source copies nothing.
fn copy_tree(source: &Path, target: &Path) -> Result<usize, AppError> {
    if !source.is_dir() {
        return Ok(0);
    }
    std::fs::create_dir_all(target)?;

    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| AppError::Io(e.into()))?;
        if entry.file_name() == PLACEHOLDER_FILE {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| AppError::Internal(e.into()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else {
            std::fs::copy(entry.path(), &destination)?;
            copied += 1;
        }
    }

    Ok(copied)
}

//! Row-level backup and restore
//!
//! Serializes every podcast row into a timestamped JSON document and loads
//! it back into an emptied table.

use std::path::Path;

use chrono::{DateTime, Utc};

use super::write_json_atomic;
use crate::data::{Database, RowsBackup};
use crate::error::AppError;

/// Outcome of a row-level restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsRestoreReport {
    pub restored: usize,
    pub failed: usize,
    /// `None` when no backup document existed
    pub backup_timestamp: Option<DateTime<Utc>>,
}

/// Write all rows to `path`, returning how many were exported
pub async fn export_rows(db: &Database, path: &Path) -> Result<usize, AppError> {
    let podcasts = db.list_podcasts().await?;
    let count = podcasts.len();
    let backup = RowsBackup {
        timestamp: Utc::now(),
        podcasts,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    write_json_atomic(path, &backup).await?;

    tracing::info!(path = %path.display(), rows = count, "Rows exported");
    Ok(count)
}

/// Replace the table contents with the rows in `path`.
///
/// A missing document is a no-op. Individual insert failures are counted
/// and do not abort the batch.
pub async fn import_rows(db: &Database, path: &Path) -> Result<RowsRestoreReport, AppError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No rows backup found, skipping restore");
            return Ok(RowsRestoreReport {
                restored: 0,
                failed: 0,
                backup_timestamp: None,
            });
        }
        Err(error) => return Err(error.into()),
    };
    let backup: RowsBackup = serde_json::from_slice(&bytes)?;

    let cleared = db.clear_podcasts().await?;
    tracing::debug!(rows = cleared, "Cleared podcasts table");

    let mut restored = 0;
    let mut failed = 0;
    for podcast in &backup.podcasts {
        match db.restore_podcast(podcast).await {
            Ok(()) => restored += 1,
            Err(error) => {
                failed += 1;
                tracing::warn!(id = podcast.id, %error, "Failed to restore row");
            }
        }
    }

    tracing::info!(
        restored,
        failed,
        backup_timestamp = %backup.timestamp,
        "Rows restored"
    );
    Ok(RowsRestoreReport {
        restored,
        failed,
        backup_timestamp: Some(backup.timestamp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NewPodcast, Podcast};
    use tempfile::TempDir;

    fn new_podcast(title: &str) -> NewPodcast {
        NewPodcast {
            title: title.to_string(),
            description: String::new(),
            filename: format!("{title}.mp3"),
            originalname: format!("{title}.mp3"),
            filesize: 1000,
            file_url: format!("/uploads/{title}.mp3"),
        }
    }

    fn summary(rows: &[Podcast]) -> Vec<(i64, String, Option<String>)> {
        let mut summary: Vec<_> = rows
            .iter()
            .map(|row| (row.id, row.title.clone(), row.file_url.clone()))
            .collect();
        summary.sort();
        summary
    }

    #[tokio::test]
    async fn export_then_import_reproduces_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("podcast.db"))
            .await
            .unwrap();
        for title in ["Ep1", "Ep2", "Ep3"] {
            db.insert_podcast(&new_podcast(title)).await.unwrap();
        }
        db.delete_podcast(2).await.unwrap();
        let before = db.list_podcasts().await.unwrap();

        let path = temp_dir.path().join("podcasts-backup.json");
        assert_eq!(export_rows(&db, &path).await.unwrap(), 2);

        db.clear_podcasts().await.unwrap();
        db.insert_podcast(&new_podcast("Stray")).await.unwrap();

        let report = import_rows(&db, &path).await.unwrap();
        assert_eq!(report.restored, 2);
        assert_eq!(report.failed, 0);
        assert!(report.backup_timestamp.is_some());

        let after = db.list_podcasts().await.unwrap();
        assert_eq!(summary(&after), summary(&before));
    }

    #[tokio::test]
    async fn import_without_document_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("podcast.db"))
            .await
            .unwrap();
        db.insert_podcast(&new_podcast("Keep")).await.unwrap();

        let report = import_rows(&db, &temp_dir.path().join("missing.json"))
            .await
            .unwrap();
        assert_eq!(report.restored, 0);
        assert!(report.backup_timestamp.is_none());
        assert_eq!(db.count_podcasts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn import_counts_failed_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("podcast.db"))
            .await
            .unwrap();
        let row = db.insert_podcast(&new_podcast("Dup")).await.unwrap();

        let path = temp_dir.path().join("dup.json");
        let backup = RowsBackup {
            timestamp: Utc::now(),
            podcasts: vec![row.clone(), row],
        };
        tokio::fs::write(&path, serde_json::to_vec(&backup).unwrap())
            .await
            .unwrap();

        let report = import_rows(&db, &path).await.unwrap();
        assert_eq!((report.restored, report.failed), (1, 1));
    }
}

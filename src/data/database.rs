//! Local embedded database (SQLite)
//!
//! The store of last resort and the only store consulted by the share page.
//! Uses SQLx with a single-file database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::path::{Path, PathBuf};

use super::models::{NewPodcast, Podcast};
use super::store::PodcastStore;
use crate::error::AppError;

const CREATE_PODCASTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS podcasts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        filename TEXT NOT NULL,
        originalname TEXT NOT NULL,
        duration TEXT,
        filesize INTEGER,
        file_url TEXT,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )
"#;

/// Column list normalizing NULLs left by older schema revisions
const PODCAST_COLUMNS: &str = "id, title, COALESCE(description, '') AS description, filename, \
     originalname, duration, COALESCE(filesize, 0) AS filesize, file_url, created_at";

/// Format SQLite's `CURRENT_TIMESTAMP` produces, kept for restored rows so
/// `ORDER BY created_at` compares like with like
const SQLITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database file and ensure the schema.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        ensure_schema(&pool).await?;
        tracing::info!(path = %path.display(), "Local database connected");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// All podcasts, newest first
    pub async fn list_podcasts(&self) -> Result<Vec<Podcast>, AppError> {
        let rows = sqlx::query_as::<_, Podcast>(&format!(
            "SELECT {PODCAST_COLUMNS} FROM podcasts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get_podcast(&self, id: i64) -> Result<Option<Podcast>, AppError> {
        let row = sqlx::query_as::<_, Podcast>(&format!(
            "SELECT {PODCAST_COLUMNS} FROM podcasts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert a new podcast; id and `created_at` are assigned by SQLite
    pub async fn insert_podcast(&self, podcast: &NewPodcast) -> Result<Podcast, AppError> {
        let row = sqlx::query_as::<_, Podcast>(&format!(
            r#"
            INSERT INTO podcasts (title, description, filename, originalname, filesize, file_url)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {PODCAST_COLUMNS}
            "#
        ))
        .bind(&podcast.title)
        .bind(&podcast.description)
        .bind(&podcast.filename)
        .bind(&podcast.originalname)
        .bind(podcast.filesize)
        .bind(&podcast.file_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Insert a row with its original id and timestamp
    pub async fn restore_podcast(&self, podcast: &Podcast) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO podcasts (
                id, title, description, filename, originalname,
                duration, filesize, file_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(podcast.id)
        .bind(&podcast.title)
        .bind(&podcast.description)
        .bind(&podcast.filename)
        .bind(&podcast.originalname)
        .bind(&podcast.duration)
        .bind(podcast.filesize)
        .bind(&podcast.file_url)
        .bind(format_timestamp(&podcast.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns whether a row was deleted
    pub async fn delete_podcast(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM podcasts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every row, returning how many were removed
    pub async fn clear_podcasts(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM podcasts")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_podcasts(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM podcasts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Write a consistent copy of the database to `target` (`VACUUM INTO`).
    ///
    /// Safe while the server is writing. An existing target is replaced.
    pub async fn snapshot_to(&self, target: &Path) -> Result<(), AppError> {
        if tokio::fs::try_exists(target).await? {
            tokio::fs::remove_file(target).await?;
        }
        let escaped = target.to_string_lossy().replace('\'', "''");
        sqlx::query(&format!("VACUUM INTO '{}'", escaped))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(SQLITE_TIMESTAMP_FORMAT).to_string()
}

/// Create the table, and add columns introduced after the first schema
async fn ensure_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(CREATE_PODCASTS_TABLE).execute(pool).await?;

    let columns = sqlx::query("PRAGMA table_info(podcasts)")
        .fetch_all(pool)
        .await?;
    let has_file_url = columns
        .iter()
        .any(|column| column.get::<String, _>("name") == "file_url");

    if !has_file_url {
        sqlx::query("ALTER TABLE podcasts ADD COLUMN file_url TEXT")
            .execute(pool)
            .await?;
        tracing::info!("Added file_url column to podcasts table");
    }

    Ok(())
}

#[async_trait]
impl PodcastStore for Database {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> Result<Vec<Podcast>, AppError> {
        self.list_podcasts().await
    }

    async fn get(&self, id: i64) -> Result<Option<Podcast>, AppError> {
        self.get_podcast(id).await
    }

    async fn insert(&self, podcast: &NewPodcast) -> Result<Podcast, AppError> {
        self.insert_podcast(podcast).await
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        self.delete_podcast(id).await
    }
}

//! Data models
//!
//! The podcast record is the only persisted entity. Ids are integers
//! assigned by whichever store performs the insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored podcast episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Podcast {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Generated local file name or object-storage key
    pub filename: String,
    /// File name supplied by the uploader
    pub originalname: String,
    /// Never populated; kept for schema compatibility
    #[serde(default)]
    pub duration: Option<String>,
    /// Size in bytes, 0 when unknown
    #[serde(default)]
    pub filesize: i64,
    /// Directly playable URL (relative `/uploads/...` or absolute)
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Podcast {
    /// Source for the share page audio element
    pub fn playable_url(&self) -> String {
        match self.file_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("/uploads/{}", self.filename),
        }
    }
}

/// Metadata for a podcast that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPodcast {
    pub title: String,
    pub description: String,
    pub filename: String,
    pub originalname: String,
    pub filesize: i64,
    pub file_url: String,
}

/// Row-level backup document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowsBackup {
    pub timestamp: DateTime<Utc>,
    pub podcasts: Vec<Podcast>,
}

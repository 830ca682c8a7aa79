//! Database tests

use super::*;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn new_podcast(title: &str) -> NewPodcast {
    NewPodcast {
        title: title.to_string(),
        description: format!("{title} description"),
        filename: format!("{title}.mp3"),
        originalname: format!("{title}-original.mp3"),
        filesize: 1000,
        file_url: format!("/uploads/{title}.mp3"),
    }
}

#[tokio::test]
async fn test_database_connection_creates_parent_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested/data/podcast.db");

    let db = Database::connect(&db_path).await.unwrap();
    assert!(db_path.exists());
    assert_eq!(db.count_podcasts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_podcast_crud() {
    let (db, _temp_dir) = create_test_db().await;

    // Insert assigns ids in order
    let first = db.insert_podcast(&new_podcast("Ep1")).await.unwrap();
    let second = db.insert_podcast(&new_podcast("Ep2")).await.unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.filesize, 1000);
    assert_eq!(first.file_url.as_deref(), Some("/uploads/Ep1.mp3"));
    assert!(first.duration.is_none());

    // Get by ID
    let retrieved = db.get_podcast(first.id).await.unwrap().unwrap();
    assert_eq!(retrieved.title, "Ep1");
    assert_eq!(retrieved.originalname, "Ep1-original.mp3");

    // List newest first
    let rows = db.list_podcasts().await.unwrap();
    let ids: Vec<_> = rows.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![2, 1]);

    // Delete
    assert!(db.delete_podcast(first.id).await.unwrap());
    assert!(!db.delete_podcast(first.id).await.unwrap());
    assert!(db.get_podcast(first.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_restore_keeps_ids_and_timestamps() {
    let (db, _temp_dir) = create_test_db().await;
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();

    let podcast = Podcast {
        id: 42,
        title: "Restored".to_string(),
        description: String::new(),
        filename: "restored.mp3".to_string(),
        originalname: "restored.mp3".to_string(),
        duration: None,
        filesize: 0,
        file_url: None,
        created_at,
    };
    db.restore_podcast(&podcast).await.unwrap();

    let retrieved = db.get_podcast(42).await.unwrap().unwrap();
    assert_eq!(retrieved, podcast);

    // New inserts continue after the restored id
    let next = db.insert_podcast(&new_podcast("Next")).await.unwrap();
    assert_eq!(next.id, 43);
    let rows = db.list_podcasts().await.unwrap();
    assert_eq!(rows[0].id, 43);
}

#[tokio::test]
async fn test_clear_podcasts() {
    let (db, _temp_dir) = create_test_db().await;
    db.insert_podcast(&new_podcast("a")).await.unwrap();
    db.insert_podcast(&new_podcast("b")).await.unwrap();

    assert_eq!(db.clear_podcasts().await.unwrap(), 2);
    assert_eq!(db.count_podcasts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_legacy_table_gains_file_url_column() {
    use sqlx::Connection;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("legacy.db");
    let connection_string = format!("sqlite:{}?mode=rwc", db_path.display());
    let mut connection = sqlx::SqliteConnection::connect(&connection_string)
        .await
        .unwrap();
    sqlx::query(
        r#"
        CREATE TABLE podcasts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            filename TEXT NOT NULL,
            originalname TEXT NOT NULL,
            duration TEXT,
            filesize INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut connection)
    .await
    .unwrap();
    sqlx::query("INSERT INTO podcasts (title, filename, originalname) VALUES ('Old', 'old.mp3', 'old.mp3')")
        .execute(&mut connection)
        .await
        .unwrap();
    connection.close().await.unwrap();

    let db = Database::connect(&db_path).await.unwrap();
    let old = db.get_podcast(1).await.unwrap().unwrap();
    assert_eq!(old.description, "");
    assert_eq!(old.filesize, 0);
    assert!(old.file_url.is_none());
    assert_eq!(old.playable_url(), "/uploads/old.mp3");

    let fresh = db.insert_podcast(&new_podcast("New")).await.unwrap();
    assert_eq!(fresh.file_url.as_deref(), Some("/uploads/New.mp3"));
}

#[tokio::test]
async fn test_snapshot_creates_valid_copy() {
    let (db, temp_dir) = create_test_db().await;
    db.insert_podcast(&new_podcast("snap")).await.unwrap();

    let target = temp_dir.path().join("snapshot.db");
    db.snapshot_to(&target).await.unwrap();
    // Existing snapshots are replaced
    db.snapshot_to(&target).await.unwrap();

    let bytes = tokio::fs::read(&target).await.unwrap();
    assert_eq!(&bytes[..16], b"SQLite format 3\0");

    let copy = Database::connect(&target).await.unwrap();
    assert_eq!(copy.count_podcasts().await.unwrap(), 1);
}

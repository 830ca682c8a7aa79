//! Remote managed database
//!
//! A hosted Postgres exposed through PostgREST (e.g. Supabase). Preferred
//! over the local database whenever it is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::Deserialize;

use super::models::{NewPodcast, Podcast};
use super::store::PodcastStore;
use crate::config::RemoteDatabaseConfig;
use crate::error::AppError;

/// Row as returned by PostgREST; nullable columns are optional
#[derive(Debug, Deserialize)]
struct RemoteRow {
    id: i64,
    title: String,
    description: Option<String>,
    filename: String,
    originalname: String,
    duration: Option<String>,
    filesize: Option<i64>,
    file_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RemoteRow> for Podcast {
    fn from(row: RemoteRow) -> Self {
        Podcast {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            filename: row.filename,
            originalname: row.originalname,
            duration: row.duration,
            filesize: row.filesize.unwrap_or(0),
            file_url: row.file_url,
            created_at: row.created_at,
        }
    }
}

/// PostgREST client for the podcasts table
pub struct RemoteDatabase {
    client: reqwest::Client,
    /// e.g. "https://abc.supabase.co/rest/v1/podcasts"
    table_url: String,
    api_key: String,
}

impl RemoteDatabase {
    /// Build a client when URL and key are configured.
    pub fn from_config(
        config: &RemoteDatabaseConfig,
        client: reqwest::Client,
    ) -> Option<Self> {
        let (url, key) = config.credentials()?;
        Some(Self::new(client, url, key, &config.table))
    }

    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str, table: &str) -> Self {
        Self {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(response: Response) -> Result<Vec<Podcast>, AppError> {
        let response = check_status(response).await?;
        let rows: Vec<RemoteRow> = response.json().await?;
        Ok(rows.into_iter().map(Podcast::from).collect())
    }

    pub async fn list_podcasts(&self) -> Result<Vec<Podcast>, AppError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Self::rows(response).await
    }

    pub async fn get_podcast(&self, id: i64) -> Result<Option<Podcast>, AppError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;

        Ok(Self::rows(response).await?.into_iter().next())
    }

    pub async fn insert_podcast(&self, podcast: &NewPodcast) -> Result<Podcast, AppError> {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&[podcast])
            .send()
            .await?;

        Self::rows(response).await?.into_iter().next().ok_or_else(|| {
            AppError::RemoteStore("insert returned no representation".to_string())
        })
    }

    /// Deleting an id that matches no row is not an error
    pub async fn delete_podcast(&self, id: i64) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::DELETE)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::RemoteStore(describe_failure(status, &body)))
}

/// PostgREST error bodies carry a `message`; fall back to the raw body
fn describe_failure(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status.as_u16(), message)
    }
}

#[async_trait]
impl PodcastStore for RemoteDatabase {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn idempotent_delete(&self) -> bool {
        true
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
        self.delete_podcast(id).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_url_joins_base_and_table() {
        let remote = RemoteDatabase::new(
            reqwest::Client::new(),
            "https://abc.supabase.co/",
            "key",
            "podcasts",
        );
        assert_eq!(remote.table_url, "https://abc.supabase.co/rest/v1/podcasts");
    }

    #[test]
    fn from_config_requires_url_and_key() {
        let mut config = RemoteDatabaseConfig {
            url: Some("https://abc.supabase.co".to_string()),
            ..RemoteDatabaseConfig::default()
        };
        assert!(RemoteDatabase::from_config(&config, reqwest::Client::new()).is_none());

        config.anon_key = Some("anon".to_string());
        let remote = RemoteDatabase::from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(remote.api_key, "anon");
    }

    #[test]
    fn describe_failure_prefers_postgrest_message() {
        let message = describe_failure(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value"}"#,
        );
        assert_eq!(message, "409: duplicate key value");

        assert_eq!(
            describe_failure(StatusCode::BAD_GATEWAY, "upstream down"),
            "502: upstream down"
        );
        assert_eq!(
            describe_failure(StatusCode::SERVICE_UNAVAILABLE, ""),
            "503 Service Unavailable"
        );
    }

    #[test]
    fn remote_rows_normalize_nulls() {
        let row: RemoteRow = serde_json::from_value(serde_json::json!({
            "id": 5,
            "title": "Remote",
            "description": null,
            "filename": "podcast-uploads/01HZX",
            "originalname": "remote.mp3",
            "duration": null,
            "filesize": null,
            "file_url": "https://cdn.example.com/podcast-uploads/01HZX.mp3",
            "created_at": "2025-01-02T03:04:05.123456+00:00"
        }))
        .unwrap();

        let podcast = Podcast::from(row);
        assert_eq!(podcast.description, "");
        assert_eq!(podcast.filesize, 0);
        assert_eq!(podcast.id, 5);
    }
}

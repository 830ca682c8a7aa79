//! Common test utilities for E2E tests

#![allow(dead_code)]

pub mod fake_remote;

use podshare::{AppState, config};
use reqwest::multipart::{Form, Part};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Per-file ceiling used by test servers
pub const TEST_MAX_FILE_BYTES: usize = 64 * 1024;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Server with only the local database and local audio storage
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Server whose store chain starts with the remote database at `remote_url`
    pub async fn with_remote(remote_url: &str) -> Self {
        let remote_url = remote_url.to_string();
        Self::with_config(move |config| {
            config.remote_db.url = Some(remote_url);
            config.remote_db.service_role_key = Some("test-service-key".to_string());
        })
        .await
    }

    pub async fn with_config(customize: impl FnOnce(&mut config::AppConfig)) -> Self {
        let temp_dir = TempDir::new().unwrap();

        let mut config = config::AppConfig::with_data_dir(&temp_dir.path().join("data"));
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.upload.max_file_bytes = TEST_MAX_FILE_BYTES;
        customize(&mut config);

        let state = AppState::new(config).await.unwrap();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = podshare::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// POST /api/upload with an audio part of `size` bytes
    pub async fn upload(
        &self,
        title: &str,
        file_name: &str,
        content_type: &str,
        size: usize,
    ) -> reqwest::Response {
        let form = audio_form(title, "", file_name, content_type, size);
        self.client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    pub async fn local_rows(&self) -> i64 {
        self.state.db.count_podcasts().await.unwrap()
    }

    /// Files currently in the uploads directory
    pub fn uploaded_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.state.paths.uploads_dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub fn audio_form(
    title: &str,
    description: &str,
    file_name: &str,
    content_type: &str,
    size: usize,
) -> Form {
    let part = Part::bytes(vec![0x49u8; size])
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .unwrap();

    Form::new()
        .text("title", title.to_string())
        .text("description", description.to_string())
        .part("audio", part)
}

//! podshare - upload audio, list it, and share it on a public page
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Podcast JSON API, share page, upload form                 │
//! │  - /uploads static files, /metrics                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Store fallback chain for metadata                         │
//! │  - Fire-and-forget mirror and backup tasks                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │          Data Layer          │        Storage Layer         │
//! │  - Remote PostgREST table    │  - Local uploads directory   │
//! │  - Local SQLite (sqlx)       │  - S3-compatible bucket      │
//! │  - Legacy JSON mirror        │                              │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Podcast orchestration and side effects
//! - `data`: Metadata stores
//! - `storage`: Audio file backends
//! - `maintenance`: Backup, restore, migrate, init and diagnostics
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod maintenance;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

use data::PodcastStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Local SQLite database
    pub db: Arc<data::Database>,

    /// Podcast orchestration over stores and audio storage
    pub podcasts: Arc<service::PodcastService>,

    /// Resolved data directory layout
    pub paths: Arc<config::DataPaths>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to the local SQLite database
    /// 2. Build the remote store client when configured
    /// 3. Select the audio storage backend
    /// 4. Start the side-effect observer
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let paths = config.data_paths();

        // 1. Local database
        let db = Arc::new(data::Database::connect(&paths.db_path).await?);
        tracing::info!(path = %paths.db_path.display(), "Database connected");

        // 2. Store chain, highest priority first
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("podshare/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let mut stores: Vec<Arc<dyn PodcastStore>> = Vec::new();
        match data::RemoteDatabase::from_config(&config.remote_db, http_client) {
            Some(remote) => {
                tracing::info!(table = %config.remote_db.table, "Remote database configured");
                stores.push(Arc::new(remote));
            }
            None => tracing::info!("Remote database not configured; using local database only"),
        }
        stores.push(db.clone());
        let stores = data::StoreChain::new(stores);

        // 3. Audio storage
        let storage =
            storage::select_audio_storage(&config.object_storage, &paths.uploads_dir).await?;

        // 4. Side effects
        let (side_effects, _observer) = service::SideEffects::start();

        let legacy_cache = config.legacy_cache_path().map(|path| {
            tracing::info!(path = %path.display(), "Legacy cache mirror enabled");
            Arc::new(data::LegacyCache::new(path))
        });

        let podcasts = service::PodcastService::new(
            stores,
            db.clone(),
            storage,
            side_effects,
            service::PodcastServiceOptions {
                max_file_bytes: config.upload.max_file_bytes,
                rows_backup_path: Some(paths.rows_backup_path.clone()),
                legacy_cache,
            },
        );

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            podcasts: Arc::new(podcasts),
            paths: Arc::new(paths),
        })
    }

    /// Release the database pool
    pub async fn shutdown(&self) {
        self.db.close().await;
        tracing::info!("Database connection closed");
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer,
        cors::CorsLayer,
        services::{ServeDir, ServeFile},
        trace::TraceLayer,
    };

    let mut router = Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(api::podcast_router(state.config.upload.max_file_bytes))
        .nest_service("/uploads", ServeDir::new(&state.paths.uploads_dir));

    if let Some(static_dir) = &state.config.server.static_dir {
        tracing::info!(dir = %static_dir.display(), "Serving front end");
        router = router.fallback_service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        );
    }

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

/// Install the subscriber; `PODSHARE__LOGGING__FORMAT=json` selects JSON output
pub fn init_tracing(logging: &config::LoggingConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn health_check() -> &'static str {
    "OK"
}

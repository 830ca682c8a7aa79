//! API layer
//!
//! HTTP handlers for:
//! - Podcast JSON API (`/api/...`)
//! - Share page and upload form
//! - Metrics (Prometheus)

pub mod metrics;
mod pages;
mod podcasts;

use std::convert::Infallible;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::AppState;

pub use metrics::metrics_router;
pub use pages::render_share_page;
pub use podcasts::{MessageResponse, ShareInfo, UploadResponse};

/// Multipart framing allowance on top of the per-file ceiling
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Podcast API, share page and upload form
pub fn podcast_router(max_file_bytes: usize) -> Router<AppState> {
    let upload = post(podcasts::upload_podcast).layer::<_, Infallible>(DefaultBodyLimit::max(
        max_file_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
    ));

    Router::new()
        .route("/api/podcasts", get(podcasts::list_podcasts))
        .route(
            "/api/podcasts/:id",
            get(podcasts::get_podcast).delete(podcasts::delete_podcast),
        )
        .route("/api/podcasts/:id/share", get(podcasts::share_info))
        .route("/api/upload", upload)
        .route("/share/:id", get(pages::share_page))
        .route("/upload", get(pages::upload_form))
        .route_layer(axum::middleware::from_fn(metrics::track_requests))
}

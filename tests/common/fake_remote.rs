//! In-process stand-in for a PostgREST podcasts table

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    next_id: i64,
}

#[derive(Clone, Default)]
struct FakeState {
    table: Arc<Mutex<Table>>,
    failing: Arc<AtomicBool>,
}

/// Handle to a running fake; dropping it leaves the server running until the test ends
pub struct FakeRemote {
    pub url: String,
    state: FakeState,
}

impl FakeRemote {
    pub async fn start() -> Self {
        let state = FakeState::default();

        let app = Router::new()
            .route(
                "/rest/v1/podcasts",
                get(list_rows).post(insert_rows).delete(delete_rows),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Answer every request with a 503 while set
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<Value> {
        self.state.table.lock().unwrap().rows.clone()
    }
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"message": "remote unavailable"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("apikey").is_some()
        && headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("Bearer "))
}

fn id_filter(query: &HashMap<String, String>) -> Option<i64> {
    query.get("id")?.strip_prefix("eq.")?.parse().ok()
}

async fn list_rows(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return unavailable();
    }
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let table = state.table.lock().unwrap();
    let mut rows: Vec<Value> = match id_filter(&query) {
        Some(id) => table
            .rows
            .iter()
            .filter(|row| row["id"] == json!(id))
            .cloned()
            .collect(),
        None => table.rows.clone(),
    };
    rows.reverse();
    Json(rows).into_response()
}

async fn insert_rows(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Vec<Value>>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return unavailable();
    }
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut table = state.table.lock().unwrap();
    let mut inserted = Vec::new();
    for mut row in body {
        table.next_id += 1;
        row["id"] = json!(table.next_id);
        row["duration"] = Value::Null;
        row["created_at"] = json!(chrono::Utc::now().to_rfc3339());
        table.rows.push(row.clone());
        inserted.push(row);
    }

    (StatusCode::CREATED, Json(inserted)).into_response()
}

async fn delete_rows(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return unavailable();
    }
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Some(id) = id_filter(&query) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "delete requires a filter"})),
        )
            .into_response();
    };

    state
        .table
        .lock()
        .unwrap()
        .rows
        .retain(|row| row["id"] != json!(id));
    StatusCode::NO_CONTENT.into_response()
}

//! The inbound HTTP surface: one route per operation in this system's
//! external interface. Every mutating handler acquires `AppState`'s single
//! exclusive lock for the duration of its work and releases it before
//! responding.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use explorer_core::CoreError;

use crate::fetch::fetch_into;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/taglist", get(taglist))
        .route("/fetch_data", post(fetch_data))
        .route("/build_working_table", post(build_working_table))
        .route("/site_settings", get(get_site_settings).post(post_site_settings))
        .route("/tag_settings", get(get_tag_settings).post(post_tag_settings))
        .route("/clear_cache", post(clear_cache))
        .route("/shutdown", post(shutdown))
        .route("/restart", post(restart))
        .route("/log_event", post(log_event))
        .with_state(state)
}

/// Maps the documented error kinds to HTTP status codes: `BadRequest` and
/// `ExportRange` are 400 with `{"error": msg}`; everything else recovers
/// locally and never reaches this boundary as an error at all.
struct ApiError(CoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::BadRequest(_) | CoreError::ExportRange => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    ApiError(CoreError::BadRequest(msg.into()))
}

#[derive(Deserialize)]
struct TaglistQuery {
    #[serde(default)]
    refresh: bool,
}

async fn taglist(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaglistQuery>,
) -> Json<Value> {
    let mut shared = state.inner.lock().await;
    if query.refresh {
        shared.taglist = state.upstream.fetch_taglist().await;
        if let Err(err) = explorer_core::durability::write_json_atomic(
            &state.cache_dir().join("Taglist.json"),
            &shared.taglist,
        ) {
            tracing::error!(%err, "failed to persist taglist");
        }
    }
    Json(json!(shared.taglist))
}

#[derive(Deserialize)]
struct FetchDataRequest {
    tags: Vec<String>,
    #[serde(rename = "startDateUnixSeconds")]
    start_date_unix_seconds: i64,
    #[serde(rename = "endDateUnixSeconds")]
    end_date_unix_seconds: i64,
}

#[derive(Serialize)]
struct FetchDataResponse {
    status: &'static str,
    #[serde(rename = "newData")]
    new_data: bool,
    #[serde(rename = "redrawNeeded")]
    redraw_needed: bool,
}

async fn fetch_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FetchDataRequest>,
) -> Result<Json<FetchDataResponse>, ApiError> {
    if req.tags.is_empty() {
        return Err(bad_request("tags must be a non-empty list"));
    }
    if req.start_date_unix_seconds > req.end_date_unix_seconds {
        return Err(bad_request("startDateUnixSeconds must not exceed endDateUnixSeconds"));
    }

    let outcome = fetch_into(
        &state,
        &req.tags,
        req.start_date_unix_seconds,
        req.end_date_unix_seconds,
    )
    .await;

    Ok(Json(FetchDataResponse {
        status: "ok",
        new_data: outcome.new_data,
        redraw_needed: outcome.new_data,
    }))
}

#[derive(Deserialize)]
struct BuildWorkingTableRequest {
    #[serde(rename = "dataOffset")]
    data_offset: f64,
    #[serde(rename = "forwardFill")]
    forward_fill: Option<bool>,
}

#[derive(Serialize)]
struct BuildWorkingTableResponse {
    data: Vec<Value>,
    #[serde(rename = "redrawNeeded")]
    redraw_needed: bool,
}

async fn build_working_table(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuildWorkingTableRequest>,
) -> Json<BuildWorkingTableResponse> {
    let mut shared = state.inner.lock().await;
    let forward_fill = req
        .forward_fill
        .unwrap_or(shared.tag_settings.global_forward_fill);
    let tag_settings = shared.tag_settings.clone();
    let shared = &mut *shared;
    let outcome = shared.working_builder.build(
        &shared.raw,
        req.data_offset,
        forward_fill,
        &tag_settings,
    );

    if outcome.redraw_needed {
        if let Err(err) = explorer_core::durability::write_table_csv_atomic(
            &state.cache_dir().join("WorkingTable.csv"),
            outcome.table.as_raw(),
        ) {
            tracing::error!(%err, "failed to persist working table");
        }
    }

    Json(BuildWorkingTableResponse {
        data: outcome.table.serialize(),
        redraw_needed: outcome.redraw_needed,
    })
}

async fn get_site_settings(State(state): State<Arc<AppState>>) -> Json<Value> {
    let shared = state.inner.lock().await;
    Json(json!(shared.site_settings))
}

async fn post_site_settings(
    State(state): State<Arc<AppState>>,
    Json(posted): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut shared = state.inner.lock().await;
    let mut merged = serde_json::to_value(&shared.site_settings).unwrap_or(json!({}));
    merge_json(&mut merged, posted);
    shared.site_settings = serde_json::from_value(merged)
        .map_err(|err| bad_request(format!("invalid site settings: {err}")))?;

    if let Err(err) = explorer_core::durability::write_json_atomic(
        &state.settings_dir().join("SiteSettings.json"),
        &shared.site_settings,
    ) {
        tracing::error!(%err, "failed to persist site settings");
    }
    Ok(Json(json!(shared.site_settings)))
}

async fn get_tag_settings(State(state): State<Arc<AppState>>) -> Json<Value> {
    let shared = state.inner.lock().await;
    Json(json!(shared.tag_settings))
}

async fn post_tag_settings(
    State(state): State<Arc<AppState>>,
    Json(posted): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut shared = state.inner.lock().await;
    shared.tag_settings = serde_json::from_value(posted)
        .map_err(|err| bad_request(format!("invalid tag settings: {err}")))?;

    if let Err(err) = explorer_core::durability::write_json_atomic(
        &state.settings_dir().join("TagSettings.json"),
        &shared.tag_settings,
    ) {
        tracing::error!(%err, "failed to persist tag settings");
    }
    Ok(Json(json!(shared.tag_settings)))
}

/// Shallow merge of `patch` over `base`, used so a partial `/site_settings`
/// POST body does not clobber keys it didn't mention.
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                base_map.insert(key, value);
            }
        }
        (base, patch) => *base = patch,
    }
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut shared = state.inner.lock().await;
    shared.raw = explorer_core::RawTable::new();
    shared.coverage = explorer_core::CoverageLedger::new();
    shared.taglist = Vec::new();
    shared.working_builder = explorer_core::WorkingTableBuilder::new();

    for name in ["Taglist.json", "RawTable.csv", "WorkingTable.csv", "TagCoverage.json"] {
        let path = state.cache_dir().join(name);
        if let Err(err) = remove_if_present(&path) {
            tracing::warn!(?path, %err, "failed to remove cache file");
        }
    }

    tracing::info!("cache cleared via /clear_cache");
    Json(json!({ "status": "cleared" }))
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

async fn shutdown() -> Json<Value> {
    tracing::info!("shutdown requested via /shutdown");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::process::exit(0);
    });
    Json(json!({ "status": "shutting down" }))
}

async fn restart() -> Json<Value> {
    tracing::info!("restart requested via /restart");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(exe) = std::env::current_exe() {
            let _ = std::process::Command::new(exe)
                .args(std::env::args().skip(1))
                .spawn();
        }
        std::process::exit(0);
    });
    Json(json!({ "status": "restarting" }))
}

#[derive(Deserialize)]
struct LogEventRequest {
    #[serde(rename = "type")]
    kind: LogEventKind,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogEventKind {
    User,
    Script,
}

async fn log_event(Json(req): Json<LogEventRequest>) -> Json<Value> {
    match req.kind {
        LogEventKind::User => tracing::info!(target: "event::user", message = %req.message),
        LogEventKind::Script => tracing::info!(target: "event::script", message = %req.message),
    }
    Json(json!({ "status": "logged" }))
}

// rest/routes/tasks.rs — Task CRUD routes.
//
// Bodies are read as raw bytes and parsed here, then checked by
// rest::validate before the store is touched — any malformed body maps
// to 400, never the Json extractor's 415/422. Store failures map to:
// NotFound → 404, anything else (the mirror write failed) → 500. The
// process keeps running on a storage failure; in-memory and durable
// state may diverge until the next successful write.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::rest::validate::{self, FieldError};
use crate::store::{StoreError, Task};
use crate::AppContext;

type ApiError = (StatusCode, Json<Value>);

pub async fn list_tasks(State(ctx): State<Arc<AppContext>>) -> Json<Vec<Task>> {
    Json(ctx.store.list().await)
}

pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let body = parse_body(&body)?;
    let req = validate::create_body(&body).map_err(bad_request)?;
    match ctx.store.create(req.text, req.completed).await {
        Ok(task) => Ok((StatusCode::CREATED, Json(task))),
        Err(e) => Err(store_failure(e)),
    }
}

pub async fn update_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, ApiError> {
    let body = parse_body(&body)?;
    let patch = validate::update_body(&body).map_err(bad_request)?;
    match ctx.store.update(&id, patch).await {
        Ok(task) => Ok(Json(task)),
        Err(StoreError::NotFound(_)) => Err(not_found()),
        Err(e) => Err(store_failure(e)),
    }
}

pub async fn delete_task(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    match ctx.store.delete(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound(_)) => Err(not_found()),
        Err(e) => Err(store_failure(e)),
    }
}

fn parse_body(bytes: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(bytes).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "must be valid JSON", "field": "body" })),
        )
    })
}

fn bad_request(e: FieldError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": e.message, "field": e.field })),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "task not found" })),
    )
}

fn store_failure(e: StoreError) -> ApiError {
    error!(err = %e, "store write failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

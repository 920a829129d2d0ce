use std::sync::Arc;

use airframe_store::ObjectStore;
use airframe_types::PutResult;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::json;

use crate::config::ServerConfig;
use crate::dto::{ObjectResponse, PutRequest, QueryParams, QueryResponse};
use crate::error::{ServerError, ServerResult};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: ObjectStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: ObjectStore, config: ServerConfig) -> Self {
        Self { store, config: Arc::new(config) }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "airframe-server",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.store.backend_name(),
    }))
}

pub async fn get_object(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
) -> ServerResult<Json<ObjectResponse>> {
    let object = state.store.get(&typ, &id)?;
    Ok(Json(object.try_into()?))
}

/// `HEAD` on an object: 200 if it exists, 404 otherwise.
pub async fn head_object(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    if state.store.exists(&typ, &id)? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

pub async fn query_objects(
    State(state): State<AppState>,
    Path(typ): Path<String>,
    Query(params): Query<QueryParams>,
) -> ServerResult<Json<QueryResponse>> {
    let limit = state.config.effective_limit(params.limit());
    let objects = state.store.query(&typ, params.query(), params.skip(), limit)?;
    let results = objects
        .into_iter()
        .map(ObjectResponse::try_from)
        .collect::<ServerResult<Vec<_>>>()?;
    Ok(Json(QueryResponse { results }))
}

pub async fn put_object(
    State(state): State<AppState>,
    Path((typ, id)): Path<(String, String)>,
    body: Result<Json<PutRequest>, JsonRejection>,
) -> ServerResult<Json<PutResult>> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let signature = request.signature_bytes()?;
    let result = state.store.put(&typ, &id, request.data, &signature)?;
    Ok(Json(result))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ServerError {
    ServerError::RouteNotFound
}

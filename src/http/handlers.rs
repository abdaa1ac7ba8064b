//! Route handlers. Each one is a thin adapter over a `TopicExchange` call.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::StoredMessage;
use crate::exchange::TopicExchange;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::registry::BindingRecord;
use crate::routing::RouteMatch;

const DEFAULT_READ_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct BindingRequest {
    pub pattern: String,
    pub queue: String,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Absent and `null` are both rejected as a missing payload.
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub delay: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReadParams {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct Valid {
    pub valid: bool,
}

#[derive(Serialize)]
pub struct Removed {
    pub removed: bool,
}

#[derive(Serialize)]
pub struct Matched {
    pub matched: usize,
}

#[derive(Serialize)]
pub struct Dropped {
    pub dropped: bool,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub bindings: usize,
}

pub async fn validate_routing_key(Path(key): Path<String>) -> Result<Json<Valid>, ApiError> {
    let valid = TopicExchange::validate_routing_key(&key)?;
    Ok(Json(Valid { valid }))
}

pub async fn validate_topic_pattern(Path(pattern): Path<String>) -> Result<Json<Valid>, ApiError> {
    let valid = TopicExchange::validate_topic_pattern(&pattern)?;
    Ok(Json(Valid { valid }))
}

pub async fn bind_topic(
    State(state): State<AppState>,
    Json(req): Json<BindingRequest>,
) -> Result<StatusCode, ApiError> {
    state.exchange.bind_topic(&req.pattern, &req.queue)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unbind_topic(
    State(state): State<AppState>,
    Json(req): Json<BindingRequest>,
) -> Json<Removed> {
    Json(Removed {
        removed: state.exchange.unbind_topic(&req.pattern, &req.queue),
    })
}

pub async fn list_bindings(State(state): State<AppState>) -> Json<Vec<BindingRecord>> {
    Json(state.exchange.list_bindings())
}

pub async fn test_routing(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<Vec<RouteMatch>> {
    Json(state.exchange.test_routing(&key))
}

pub async fn send_topic(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<Json<Matched>, ApiError> {
    let matched =
        state
            .exchange
            .send_topic_with_headers(&key, &req.payload, req.headers.as_ref(), req.delay)?;
    Ok(Json(Matched { matched }))
}

pub async fn create_queue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = if state.exchange.create_queue(&name)? {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(status)
}

pub async fn drop_queue(State(state): State<AppState>, Path(name): Path<String>) -> Json<Dropped> {
    Json(Dropped {
        dropped: state.exchange.drop_queue(&name),
    })
}

pub async fn read_messages(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ReadParams>,
) -> Result<Json<Vec<StoredMessage>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_READ_LIMIT);
    Ok(Json(state.exchange.read_messages(&name, limit)?))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        bindings: state.exchange.registry().len(),
    })
}

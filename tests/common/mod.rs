//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use topic_exchange::dispatch::MemoryQueueStore;
use topic_exchange::http::{AppState, HttpServer};
use topic_exchange::TopicExchange;

/// An exchange over a fresh store holding `queues`.
pub fn exchange_with_queues(queues: &[&str]) -> TopicExchange {
    let store = Arc::new(MemoryQueueStore::new());
    for queue in queues {
        store.create_queue(queue);
    }
    TopicExchange::new(store)
}

/// The HTTP router for `exchange`.
pub fn app(exchange: &TopicExchange) -> Router {
    HttpServer::build_router(AppState {
        exchange: exchange.clone(),
    })
}

/// Send one request through `app` and decode the JSON body (`Null` when empty).
pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// A unique path under the system temp directory.
pub fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("topic-exchange-it-{}-{name}", std::process::id()))
}

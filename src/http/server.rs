//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::exchange::TopicExchange;
use crate::http::handlers;
use crate::http::request::request_id_middleware;
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub exchange: TopicExchange,
}

/// HTTP front end for a topic exchange.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(exchange: TopicExchange) -> Self {
        Self {
            router: Self::build_router(AppState { exchange }),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "http",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = tracing::field::Empty,
            )
        });

        Router::new()
            .route("/health", get(handlers::health))
            .route("/validate/routing-key/{key}", get(handlers::validate_routing_key))
            .route("/validate/pattern/{pattern}", get(handlers::validate_topic_pattern))
            .route(
                "/bindings",
                get(handlers::list_bindings)
                    .post(handlers::bind_topic)
                    .delete(handlers::unbind_topic),
            )
            .route("/routing/{key}", get(handlers::test_routing))
            .route("/send/{key}", post(handlers::send_topic))
            .route(
                "/queues/{name}",
                post(handlers::create_queue).delete(handlers::drop_queue),
            )
            .route("/queues/{name}/messages", get(handlers::read_messages))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(trace)
                    .layer(middleware::from_fn(request_id_middleware)),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

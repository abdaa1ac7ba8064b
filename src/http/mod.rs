//! HTTP surface over the exchange.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer span)
//!     → request.rs (attach x-request-id)
//!     → handlers.rs (decode path/JSON, call TopicExchange)
//!     → response.rs (ExchangeError → status + JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};

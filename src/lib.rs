//! AMQP-style topic routing.
//!
//! Producers publish under dotted routing keys; queues declare interest by
//! binding wildcard patterns (`*` = one segment, `#` = zero or more); a
//! publish is fanned out to every queue with a matching binding.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod topic;

pub use config::ExchangeConfig;
pub use error::{ExchangeError, ExchangeResult, StoreError, ValidationError};
pub use exchange::TopicExchange;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

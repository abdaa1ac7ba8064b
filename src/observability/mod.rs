//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! registry / router / dispatcher produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Log level comes from the environment first, then configuration
//! - Metric updates go through the `metrics` facade; without an installed
//!   recorder they are no-ops, so library users pay nothing

pub mod logging;
pub mod metrics;

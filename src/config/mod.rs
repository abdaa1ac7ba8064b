//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, grammar of declared patterns)
//!     → ExchangeConfig (validated, immutable)
//!     → main.rs seeds the queue store and binding registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; runtime binding changes go through
//!   the exchange API, not the file
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BindingConfig, ExchangeConfig, ObservabilityConfig, QueueConfig};

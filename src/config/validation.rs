//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (bindings reference configured queues)
//! - Check that addresses parse and declared patterns obey the grammar
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExchangeConfig → Result<(), Vec<ConfigValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ExchangeConfig;
use crate::error::ValidationError;
use crate::topic::validate_topic_pattern;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_level: unknown level '{0}'")]
    UnknownLogLevel(String),

    #[error("queues[{index}]: name cannot be empty")]
    EmptyQueueName { index: usize },

    #[error("queues[{index}]: duplicate queue '{name}'")]
    DuplicateQueue { index: usize, name: String },

    #[error("bindings[{index}]: {source}")]
    InvalidPattern {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("bindings[{index}]: queue name cannot be empty")]
    EmptyBindingQueue { index: usize },

    #[error("bindings[{index}]: queue '{queue}' is not configured")]
    UnknownQueue { index: usize, queue: String },
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ConfigValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ConfigValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ExchangeConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    let mut queues = HashSet::new();
    for (index, queue) in config.queues.iter().enumerate() {
        if queue.name.is_empty() {
            errors.push(ConfigValidationError::EmptyQueueName { index });
        } else if !queues.insert(queue.name.as_str()) {
            errors.push(ConfigValidationError::DuplicateQueue {
                index,
                name: queue.name.clone(),
            });
        }
    }

    for (index, binding) in config.bindings.iter().enumerate() {
        if let Err(source) = validate_topic_pattern(&binding.pattern) {
            errors.push(ConfigValidationError::InvalidPattern { index, source });
        }
        if binding.queue.is_empty() {
            errors.push(ConfigValidationError::EmptyBindingQueue { index });
        } else if !queues.contains(binding.queue.as_str()) {
            errors.push(ConfigValidationError::UnknownQueue {
                index,
                queue: binding.queue.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Error taxonomy for the topic exchange.
//!
//! # Design Decisions
//! - One enum per layer, aggregated into `ExchangeError` via `#[from]`
//! - Every validation failure names the violated rule in its message
//!   and exposes a stable machine code for programmatic handling
//! - Nothing here is retried internally; errors go straight to the caller

use thiserror::Error;

/// Which grammar a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    RoutingKey,
    TopicPattern,
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::RoutingKey => f.write_str("routing key"),
            Subject::TopicPattern => f.write_str("topic pattern"),
        }
    }
}

/// Grammar violations for routing keys and topic patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} cannot be NULL or empty")]
    EmptyOrNull(Subject),

    #[error("{0} cannot exceed 255 characters")]
    TooLong(Subject),

    #[error("{0} cannot start with a dot")]
    LeadingDot(Subject),

    #[error("{0} cannot end with a dot")]
    TrailingDot(Subject),

    #[error("{0} cannot contain consecutive dots")]
    ConsecutiveDots(Subject),

    #[error("{0} cannot contain consecutive stars")]
    ConsecutiveStars(Subject),

    #[error("{0} cannot contain consecutive hashes")]
    ConsecutiveHashes(Subject),

    #[error("{0} cannot contain adjacent wildcards")]
    AdjacentWildcards(Subject),

    #[error("{0} contains invalid characters")]
    InvalidCharacters(Subject),
}

impl ValidationError {
    /// Stable identifier of the violated rule.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyOrNull(_) => "empty_or_null",
            ValidationError::TooLong(_) => "too_long",
            ValidationError::LeadingDot(_) => "leading_dot",
            ValidationError::TrailingDot(_) => "trailing_dot",
            ValidationError::ConsecutiveDots(_) => "consecutive_dots",
            ValidationError::ConsecutiveStars(_) => "consecutive_stars",
            ValidationError::ConsecutiveHashes(_) => "consecutive_hashes",
            ValidationError::AdjacentWildcards(_) => "adjacent_wildcards",
            ValidationError::InvalidCharacters(_) => "invalid_characters",
        }
    }
}

/// Failures reported by the queue store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The queue could not accept the message.
    #[error("queue '{queue}' is unavailable: {reason}")]
    QueueUnavailable { queue: String, reason: String },

    #[error("queue '{0}' does not exist")]
    QueueNotFound(String),
}

/// Errors surfaced by exchange operations.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("queue name cannot be NULL or empty")]
    QueueNameRequired,

    #[error("message payload cannot be NULL")]
    PayloadRequired,

    #[error("delay cannot be negative (got {0})")]
    NegativeDelay(i64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("binding persistence failed: {0}")]
    Persistence(String),
}

impl ExchangeError {
    /// Stable identifier used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::Validation(e) => e.code(),
            ExchangeError::QueueNameRequired => "queue_name_required",
            ExchangeError::PayloadRequired => "payload_required",
            ExchangeError::NegativeDelay(_) => "negative_delay",
            ExchangeError::Store(StoreError::QueueUnavailable { .. }) => "queue_unavailable",
            ExchangeError::Store(StoreError::QueueNotFound(_)) => "queue_not_found",
            ExchangeError::Persistence(_) => "persistence",
        }
    }
}

/// Result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Result type for queue store operations.
pub type StoreResult<T> = Result<T, StoreError>;

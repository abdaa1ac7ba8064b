//! Topic grammar subsystem.
//!
//! # Data Flow
//! ```text
//! routing key (publish side)
//!     → grammar.rs (validate_routing_key)
//!     → Router
//!
//! topic pattern (bind side)
//!     → grammar.rs (validate_topic_pattern)
//!     → pattern.rs (compile → CompiledMatcher)
//!     → Binding Registry
//! ```
//!
//! # Design Decisions
//! - Validation is the only gate between user text and the matcher
//! - Compilation is infallible on validated input and fully deterministic
//! - No regex engine: the matcher is a token automaton over bytes

pub mod grammar;
pub mod pattern;

pub use grammar::{validate_routing_key, validate_topic_pattern, MAX_LENGTH, SEPARATOR};
pub use pattern::{compile, CompiledMatcher};

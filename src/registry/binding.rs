//! Binding rows.

use serde::{Deserialize, Serialize};

use crate::topic::{compile, CompiledMatcher};

/// Unique key of a binding row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingKey {
    pub pattern: String,
    pub queue: String,
}

impl BindingKey {
    pub fn new(pattern: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            queue: queue.into(),
        }
    }
}

/// A registered interest of `queue` in keys matching `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    key: BindingKey,
    matcher: CompiledMatcher,
}

impl Binding {
    /// Build a binding for an already validated pattern.
    pub fn new(key: BindingKey) -> Self {
        let matcher = compile(&key.pattern);
        Self { key, matcher }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn pattern(&self) -> &str {
        &self.key.pattern
    }

    pub fn queue(&self) -> &str {
        &self.key.queue
    }

    pub fn matcher(&self) -> &CompiledMatcher {
        &self.matcher
    }

    /// The persisted form of this row.
    pub fn record(&self) -> BindingRecord {
        BindingRecord {
            pattern: self.key.pattern.clone(),
            queue: self.key.queue.clone(),
            compiled: self.matcher.canonical().to_string(),
        }
    }
}

/// Persisted binding row: pattern, queue, and canonical compiled form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub pattern: String,
    pub queue: String,
    pub compiled: String,
}

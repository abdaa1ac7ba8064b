//! Immutable routing snapshot.
//!
//! # Responsibilities
//! - Hold every binding visible at one instant
//! - Index bindings by their first literal segment to prune candidates
//!
//! # Design Decisions
//! - Built from scratch on every registry write; never mutated afterwards
//! - Patterns whose first segment holds a wildcard (`*.x`, `#`, `ab*.x`)
//!   cannot be pruned and are always evaluated

use std::collections::HashMap;
use std::sync::Arc;

use crate::registry::Binding;
use crate::topic::SEPARATOR;

/// A point-in-time view of the registry, shared by readers via `Arc`.
#[derive(Debug, Default)]
pub struct RoutingTable {
    by_first_segment: HashMap<String, Vec<Arc<Binding>>>,
    unindexed: Vec<Arc<Binding>>,
    len: usize,
}

impl RoutingTable {
    /// Build a table from the given bindings.
    pub fn build<'a, I>(bindings: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Binding>>,
    {
        let mut table = Self::default();
        for binding in bindings {
            match binding.matcher().first_literal_segment() {
                Some(segment) => table
                    .by_first_segment
                    .entry(segment.to_string())
                    .or_default()
                    .push(Arc::clone(binding)),
                None => table.unindexed.push(Arc::clone(binding)),
            }
            table.len += 1;
        }
        table
    }

    /// Number of bindings in this snapshot.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bindings that could match `key`: the ones indexed under the key's
    /// first segment plus every unindexed one.
    pub fn candidates<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Arc<Binding>> + 'a {
        let first = key.split(SEPARATOR).next().unwrap_or_default();
        self.by_first_segment
            .get(first)
            .into_iter()
            .flatten()
            .chain(self.unindexed.iter())
    }

    /// Every binding whose matcher accepts `key`.
    pub fn matching<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Arc<Binding>> + 'a {
        self.candidates(key).filter(move |b| b.matcher().matches(key))
    }
}

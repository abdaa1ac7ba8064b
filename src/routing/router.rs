//! Route lookup.
//!
//! # Responsibilities
//! - Resolve a routing key to every matching (pattern, queue) pair
//! - Evaluate against exactly one registry snapshot per call
//!
//! # Design Decisions
//! - No key validation here; the dispatcher validates before routing,
//!   and dry runs may route arbitrary keys
//! - Results are sorted by (pattern, queue) so output is reproducible,
//!   but callers must not attach meaning to the order

use std::sync::Arc;

use serde::Serialize;

use crate::registry::BindingRegistry;
use crate::routing::table::RoutingTable;

/// One matching binding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RouteMatch {
    pub pattern: String,
    pub queue: String,
    /// Canonical compiled form of `pattern`.
    pub compiled: String,
}

/// Resolves routing keys against the live registry.
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<BindingRegistry>,
}

impl Router {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self { registry }
    }

    /// Match `key` against the current snapshot of the registry.
    pub fn route(&self, key: &str) -> Vec<RouteMatch> {
        let table = self.registry.snapshot();
        let matches = Self::route_in(&table, key);
        tracing::debug!(
            routing_key = key,
            bindings = table.len(),
            matched = matches.len(),
            "Routed key"
        );
        matches
    }

    /// Match `key` against a specific snapshot.
    pub fn route_in(table: &RoutingTable, key: &str) -> Vec<RouteMatch> {
        let mut matches: Vec<RouteMatch> = table
            .matching(key)
            .map(|binding| RouteMatch {
                pattern: binding.pattern().to_string(),
                queue: binding.queue().to_string(),
                compiled: binding.matcher().canonical().to_string(),
            })
            .collect();
        matches.sort();
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_with(pairs: &[(&str, &str)]) -> Router {
        let registry = Arc::new(BindingRegistry::new());
        for (pattern, queue) in pairs {
            registry.bind(pattern, queue).unwrap();
        }
        Router::new(registry)
    }

    fn queues(matches: &[RouteMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.queue.as_str()).collect()
    }

    #[test]
    fn test_exact_match() {
        let router = router_with(&[("logs.error", "q")]);
        let matches = router.route("logs.error");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].queue, "q");
        assert_eq!(matches[0].compiled, r"^logs\.error$");
    }

    #[test]
    fn test_no_matches() {
        let router = router_with(&[("logs.error", "q")]);
        assert!(router.route("metrics.cpu").is_empty());
    }

    #[test]
    fn test_multiple_queues() {
        let router = router_with(&[
            ("logs.#", "all"),
            ("logs.*.error", "errors"),
            ("logs.*.critical", "critical"),
        ]);
        assert_eq!(queues(&router.route("logs.info")), vec!["all"]);
        assert_eq!(queues(&router.route("logs.api.error")), vec!["all", "errors"]);
        assert_eq!(queues(&router.route("logs.db.critical")), vec!["all", "critical"]);
    }

    #[test]
    fn test_star_vs_hash_on_same_key() {
        let router = router_with(&[("logs.*", "star"), ("logs.#", "hash")]);
        assert_eq!(router.route("logs.error").len(), 2);
        assert_eq!(queues(&router.route("logs.error.fatal")), vec!["hash"]);
    }

    #[test]
    fn test_unprunable_patterns_still_match() {
        let router = router_with(&[("#.error", "tail"), ("*.error", "one"), ("api.error", "exact")]);
        assert_eq!(queues(&router.route("api.error")), vec!["tail", "one", "exact"]);
        assert_eq!(queues(&router.route("x.y.error")), vec!["tail"]);
    }

    #[test]
    fn test_catch_all() {
        let router = router_with(&[("#", "q")]);
        for key in ["a", "logs.error", "x.y.z.w"] {
            assert_eq!(router.route(key).len(), 1, "{key}");
        }
    }

    #[test]
    fn test_route_does_not_validate_key() {
        let router = router_with(&[("#", "q")]);
        assert_eq!(router.route("not a valid key!").len(), 1);
    }
}

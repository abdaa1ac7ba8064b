//! The topic exchange facade.
//!
//! Ties one binding registry to one queue store and exposes the operations
//! callers use: validation, bind/unbind, dry-run routing and publishing.
//! When a bindings path is configured every binding change is written
//! through to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::{Dispatcher, MemoryQueueStore, QueueStore, StoredMessage};
use crate::error::{ExchangeError, ExchangeResult, StoreError};
use crate::observability::metrics;
use crate::registry::{BindingRecord, BindingRegistry};
use crate::routing::{RouteMatch, Router};
use crate::topic;

/// Topic routing over an in-memory queue store.
#[derive(Clone)]
pub struct TopicExchange {
    registry: Arc<BindingRegistry>,
    store: Arc<MemoryQueueStore>,
    router: Router,
    dispatcher: Dispatcher,
    bindings_path: Option<PathBuf>,
}

impl TopicExchange {
    /// An exchange with no bindings.
    pub fn new(store: Arc<MemoryQueueStore>) -> Self {
        Self::with_registry(store, BindingRegistry::new())
    }

    /// An exchange over an existing registry. The registry is subscribed to
    /// the store's queue deletions.
    pub fn with_registry(store: Arc<MemoryQueueStore>, registry: BindingRegistry) -> Self {
        let registry = Arc::new(registry);
        store.subscribe(registry.clone());

        let router = Router::new(registry.clone());
        let dispatcher = Dispatcher::new(router.clone(), store.clone() as Arc<dyn QueueStore>);
        Self {
            registry,
            store,
            router,
            dispatcher,
            bindings_path: None,
        }
    }

    /// Load bindings from `path` and write every later change back to it.
    pub fn open(store: Arc<MemoryQueueStore>, path: impl Into<PathBuf>) -> ExchangeResult<Self> {
        let path = path.into();
        let registry = BindingRegistry::load_from_file(&path)?;
        let mut exchange = Self::with_registry(store, registry);
        exchange.bindings_path = Some(path);
        Ok(exchange)
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<MemoryQueueStore> {
        &self.store
    }

    pub fn bindings_path(&self) -> Option<&Path> {
        self.bindings_path.as_deref()
    }

    /// Fails with the violated rule instead of returning `false`.
    pub fn validate_routing_key(key: &str) -> ExchangeResult<bool> {
        topic::validate_routing_key(key)
            .inspect_err(|e| metrics::record_validation_failure(e.code()))?;
        Ok(true)
    }

    /// Fails with the violated rule instead of returning `false`.
    pub fn validate_topic_pattern(pattern: &str) -> ExchangeResult<bool> {
        topic::validate_topic_pattern(pattern)
            .inspect_err(|e| metrics::record_validation_failure(e.code()))?;
        Ok(true)
    }

    /// Bind `pattern` to an existing `queue`. Rebinding the same pair is a no-op.
    pub fn bind_topic(&self, pattern: &str, queue: &str) -> ExchangeResult<()> {
        Self::validate_topic_pattern(pattern)?;
        if queue.is_empty() {
            return Err(ExchangeError::QueueNameRequired);
        }
        if !self.store.queue_exists(queue) {
            return Err(StoreError::QueueNotFound(queue.to_string()).into());
        }

        if self.registry.bind(pattern, queue)? {
            // A concurrent drop may have cascaded before the row existed.
            if !self.store.queue_exists(queue) {
                self.registry.unbind(pattern, queue);
                return Err(StoreError::QueueNotFound(queue.to_string()).into());
            }
            self.persist();
        }
        Ok(())
    }

    /// Returns whether a binding was removed.
    pub fn unbind_topic(&self, pattern: &str, queue: &str) -> bool {
        let removed = self.registry.unbind(pattern, queue);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn list_bindings(&self) -> Vec<BindingRecord> {
        self.registry.records()
    }

    pub fn list_bindings_for_queue(&self, queue: &str) -> Vec<BindingRecord> {
        self.registry.records_for_queue(queue)
    }

    /// Dry run: every binding matching `key`, without enqueueing.
    pub fn test_routing(&self, key: &str) -> Vec<RouteMatch> {
        self.router.route(key)
    }

    /// Publish `payload` with no headers and no delay.
    pub fn send_topic(&self, key: &str, payload: &Value) -> ExchangeResult<usize> {
        self.dispatcher.send(key, payload, None, 0)
    }

    pub fn send_topic_delayed(&self, key: &str, payload: &Value, delay: i64) -> ExchangeResult<usize> {
        self.dispatcher.send(key, payload, None, delay)
    }

    pub fn send_topic_with_headers(
        &self,
        key: &str,
        payload: &Value,
        headers: Option<&Value>,
        delay: i64,
    ) -> ExchangeResult<usize> {
        self.dispatcher.send(key, payload, headers, delay)
    }

    /// Returns `false` if the queue already existed.
    pub fn create_queue(&self, queue: &str) -> ExchangeResult<bool> {
        if queue.is_empty() {
            return Err(ExchangeError::QueueNameRequired);
        }
        Ok(self.store.create_queue(queue))
    }

    /// Drop `queue`; its bindings are removed with it.
    pub fn drop_queue(&self, queue: &str) -> bool {
        let dropped = self.store.drop_queue(queue);
        if dropped {
            self.persist();
        }
        dropped
    }

    pub fn read_messages(&self, queue: &str, limit: usize) -> ExchangeResult<Vec<StoredMessage>> {
        Ok(self.store.read(queue, limit)?)
    }

    /// Remove bindings whose queue no longer exists in the store, returning
    /// how many were removed. The result is written through.
    pub fn prune_orphans(&self) -> usize {
        let mut pruned = 0;
        for record in self.registry.records() {
            if !self.store.queue_exists(&record.queue)
                && self.registry.unbind(&record.pattern, &record.queue)
            {
                pruned += 1;
            }
        }
        if pruned > 0 {
            tracing::warn!(pruned, "Dropped bindings for unknown queues");
            self.persist();
        }
        pruned
    }

    /// Write bindings to the configured path, if any.
    pub fn save(&self) -> ExchangeResult<()> {
        match &self.bindings_path {
            Some(path) => self.registry.save_to_file(path),
            None => Ok(()),
        }
    }

    /// Write-through after a change. The in-memory change stands even if
    /// the write fails.
    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "Failed to persist bindings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Subject, ValidationError};
    use serde_json::json;

    fn exchange_with_queues(queues: &[&str]) -> TopicExchange {
        let store = Arc::new(MemoryQueueStore::new());
        for q in queues {
            store.create_queue(q);
        }
        TopicExchange::new(store)
    }

    #[test]
    fn test_validate_returns_true_or_fails() {
        assert!(TopicExchange::validate_routing_key("logs.error").unwrap());
        assert!(TopicExchange::validate_topic_pattern("logs.#").unwrap());

        let err = TopicExchange::validate_topic_pattern("logs.**").unwrap_err();
        assert_eq!(err.to_string(), "topic pattern cannot contain consecutive stars");
        let err = TopicExchange::validate_routing_key(".logs").unwrap_err();
        assert_eq!(err.to_string(), "routing key cannot start with a dot");
    }

    #[test]
    fn test_bind_requires_existing_queue() {
        let exchange = exchange_with_queues(&["q"]);
        let err = exchange.bind_topic("logs.*", "missing").unwrap_err();
        assert!(matches!(err, ExchangeError::Store(StoreError::QueueNotFound(_))));
        assert!(exchange.list_bindings().is_empty());
    }

    #[test]
    fn test_bind_error_order() {
        let exchange = exchange_with_queues(&[]);
        assert!(matches!(
            exchange.bind_topic("a..b", "").unwrap_err(),
            ExchangeError::Validation(ValidationError::ConsecutiveDots(Subject::TopicPattern))
        ));
        assert!(matches!(
            exchange.bind_topic("a.b", "").unwrap_err(),
            ExchangeError::QueueNameRequired
        ));
    }

    #[test]
    fn test_bind_is_idempotent() {
        let exchange = exchange_with_queues(&["q"]);
        for _ in 0..5 {
            exchange.bind_topic("logs.*", "q").unwrap();
        }
        assert_eq!(exchange.list_bindings_for_queue("q").len(), 1);
    }

    #[test]
    fn test_drop_queue_cascades() {
        let exchange = exchange_with_queues(&["q", "other"]);
        exchange.bind_topic("logs.*", "q").unwrap();
        exchange.bind_topic("errors.#", "q").unwrap();
        exchange.bind_topic("#", "other").unwrap();

        assert!(exchange.drop_queue("q"));
        assert!(exchange.list_bindings_for_queue("q").is_empty());
        assert_eq!(exchange.list_bindings().len(), 1);
        assert!(exchange.test_routing("logs.error").iter().all(|m| m.queue == "other"));
    }

    #[test]
    fn test_test_routing_has_no_side_effects() {
        let exchange = exchange_with_queues(&["q"]);
        exchange.bind_topic("logs.#", "q").unwrap();
        let matches = exchange.test_routing("logs.api.error");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].compiled, r"^logs\..*$");
        assert_eq!(exchange.store().queue_length("q").unwrap(), 0);
    }

    #[test]
    fn test_send_shapes() {
        let exchange = exchange_with_queues(&["q"]);
        exchange.bind_topic("logs.#", "q").unwrap();

        assert_eq!(exchange.send_topic("logs.a", &json!({"n": 1})).unwrap(), 1);
        assert_eq!(exchange.send_topic_delayed("logs.b", &json!({"n": 2}), 0).unwrap(), 1);
        let headers = json!({"trace": "abc"});
        assert_eq!(
            exchange
                .send_topic_with_headers("logs.c", &json!({"n": 3}), Some(&headers), 0)
                .unwrap(),
            1
        );

        let messages = exchange.read_messages("q", 10).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].headers, Some(headers));
    }

    #[test]
    fn test_create_queue_rejects_empty_name() {
        let exchange = exchange_with_queues(&[]);
        assert!(matches!(exchange.create_queue(""), Err(ExchangeError::QueueNameRequired)));
        assert!(exchange.create_queue("q").unwrap());
        assert!(!exchange.create_queue("q").unwrap());
    }

    #[test]
    fn test_prune_orphans_drops_rows_for_missing_queues() {
        let path = std::env::temp_dir()
            .join(format!("topic-exchange-{}-orphans.json", std::process::id()));
        let seeded = BindingRegistry::new();
        seeded.bind("logs.*", "kept").unwrap();
        seeded.bind("audit.#", "gone").unwrap();
        seeded.bind("#", "gone").unwrap();
        seeded.save_to_file(&path).unwrap();

        let store = Arc::new(MemoryQueueStore::new());
        store.create_queue("kept");
        let exchange = TopicExchange::open(store, &path).unwrap();
        assert_eq!(exchange.list_bindings().len(), 3);

        assert_eq!(exchange.prune_orphans(), 2);
        assert_eq!(exchange.list_bindings().len(), 1);
        assert!(exchange.test_routing("audit.x").is_empty());
        assert_eq!(exchange.prune_orphans(), 0);

        let reloaded = BindingRegistry::load_from_file(&path).unwrap();
        assert_eq!(reloaded.records(), exchange.list_bindings());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_changes_are_written_through() {
        let path = std::env::temp_dir()
            .join(format!("topic-exchange-{}-write-through.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let store = Arc::new(MemoryQueueStore::new());
        store.create_queue("q");
        let exchange = TopicExchange::open(store, &path).unwrap();
        exchange.bind_topic("logs.*", "q").unwrap();
        exchange.bind_topic("audit.#", "q").unwrap();
        exchange.unbind_topic("logs.*", "q");

        let reloaded = BindingRegistry::load_from_file(&path).unwrap();
        let patterns: Vec<_> = reloaded.records().into_iter().map(|r| r.pattern).collect();
        assert_eq!(patterns, vec!["audit.#".to_string()]);

        let _ = std::fs::remove_file(&path);
    }
}

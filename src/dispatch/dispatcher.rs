//! Fan-out dispatch.
//!
//! # Responsibilities
//! - Reject bad publish requests before any side effect
//! - Route the key once and enqueue one copy per distinct matched queue
//!
//! # Design Decisions
//! - A queue bound by several matching patterns receives one copy
//! - Queues are enqueued in name order; the first store failure aborts the
//!   fan-out and is returned as is. Copies already enqueued stay enqueued.
//! - Nothing is retried here

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::dispatch::store::QueueStore;
use crate::error::{ExchangeError, ExchangeResult};
use crate::observability::metrics::{self, PublishOutcome};
use crate::routing::Router;
use crate::topic::validate_routing_key;

/// Validates publish requests and fans them out to matching queues.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    store: Arc<dyn QueueStore>,
}

impl Dispatcher {
    pub fn new(router: Router, store: Arc<dyn QueueStore>) -> Self {
        Self { router, store }
    }

    /// Publish `payload` under `key`, returning the number of queues that
    /// received a copy. Zero matches is not an error.
    pub fn send(
        &self,
        key: &str,
        payload: &Value,
        headers: Option<&Value>,
        delay: i64,
    ) -> ExchangeResult<usize> {
        let span = tracing::debug_span!("publish", publish_id = %Uuid::new_v4(), routing_key = key);
        let _guard = span.enter();

        let delay_seconds = match Self::check(key, payload, delay) {
            Ok(delay_seconds) => delay_seconds,
            Err(e) => {
                metrics::record_publish(PublishOutcome::Rejected);
                tracing::warn!(error = %e, "Publish rejected");
                return Err(e);
            }
        };

        let matches = self.router.route(key);
        let queues: BTreeSet<&str> = matches.iter().map(|m| m.queue.as_str()).collect();
        if queues.is_empty() {
            metrics::record_publish(PublishOutcome::Unrouted);
            tracing::debug!("No binding matched");
            return Ok(0);
        }

        let mut delivered = 0;
        for queue in &queues {
            if let Err(e) = self.store.enqueue(queue, payload, headers, delay_seconds) {
                metrics::record_deliveries(delivered);
                metrics::record_publish(PublishOutcome::Failed);
                tracing::warn!(
                    queue,
                    delivered,
                    pending = queues.len() - delivered - 1,
                    error = %e,
                    "Fan-out aborted by store failure"
                );
                return Err(e.into());
            }
            delivered += 1;
        }

        metrics::record_deliveries(delivered);
        metrics::record_publish(PublishOutcome::Routed);
        tracing::debug!(
            bindings = matches.len(),
            queues = delivered,
            delay_seconds,
            "Fanned out message"
        );
        Ok(delivered)
    }

    /// Input checks in their reporting order. Returns the delay as seconds.
    fn check(key: &str, payload: &Value, delay: i64) -> ExchangeResult<u64> {
        validate_routing_key(key).inspect_err(|e| metrics::record_validation_failure(e.code()))?;
        if payload.is_null() {
            return Err(ExchangeError::PayloadRequired);
        }
        u64::try_from(delay).map_err(|_| ExchangeError::NegativeDelay(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::store::{MemoryQueueStore, MessageId};
    use crate::error::{StoreError, StoreResult, Subject, ValidationError};
    use crate::registry::BindingRegistry;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records enqueues and fails for the named queue.
    #[derive(Default)]
    struct ScriptedStore {
        failing: Option<&'static str>,
        calls: Mutex<Vec<(String, u64)>>,
    }

    impl QueueStore for ScriptedStore {
        fn enqueue(
            &self,
            queue: &str,
            _payload: &Value,
            _headers: Option<&Value>,
            delay_seconds: u64,
        ) -> StoreResult<MessageId> {
            if self.failing == Some(queue) {
                return Err(StoreError::QueueUnavailable {
                    queue: queue.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
            let mut calls = self.calls.lock().unwrap();
            calls.push((queue.to_string(), delay_seconds));
            Ok(calls.len() as MessageId)
        }

        fn queue_exists(&self, _queue: &str) -> bool {
            true
        }
    }

    fn dispatcher(pairs: &[(&str, &str)], store: Arc<dyn QueueStore>) -> Dispatcher {
        let registry = Arc::new(BindingRegistry::new());
        for (pattern, queue) in pairs {
            registry.bind(pattern, queue).unwrap();
        }
        Dispatcher::new(Router::new(registry), store)
    }

    #[test]
    fn test_fans_out_to_every_matching_queue() {
        let store = Arc::new(MemoryQueueStore::new());
        for q in ["a", "b", "c"] {
            store.create_queue(q);
        }
        let d = dispatcher(&[("*.error", "a"), ("api.error", "b"), ("#", "c")], store.clone());

        assert_eq!(d.send("api.error", &json!("p"), None, 0).unwrap(), 3);
        assert_eq!(d.send("db.error", &json!("p"), None, 0).unwrap(), 2);
        assert_eq!(d.send("api.info", &json!("p"), None, 0).unwrap(), 1);
        assert_eq!(store.queue_length("a").unwrap(), 2);
        assert_eq!(store.queue_length("b").unwrap(), 1);
        assert_eq!(store.queue_length("c").unwrap(), 3);
    }

    #[test]
    fn test_no_match_returns_zero() {
        let store = Arc::new(ScriptedStore::default());
        let d = dispatcher(&[("logs.#", "q")], store.clone());
        assert_eq!(d.send("metrics.cpu", &json!({}), None, 0).unwrap(), 0);
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_one_copy_per_queue() {
        let store = Arc::new(ScriptedStore::default());
        let d = dispatcher(&[("logs.*", "q"), ("logs.#", "q"), ("#", "q")], store.clone());
        assert_eq!(d.send("logs.error", &json!("x"), None, 0).unwrap(), 1);
        assert_eq!(store.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_key_rejected_first() {
        let store = Arc::new(ScriptedStore::default());
        let d = dispatcher(&[("#", "q")], store.clone());
        // Null payload and negative delay are masked by the key error.
        let err = d.send(".bad", &Value::Null, None, -1).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Validation(ValidationError::LeadingDot(Subject::RoutingKey))
        ));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_null_payload_before_negative_delay() {
        let d = dispatcher(&[("#", "q")], Arc::new(ScriptedStore::default()));
        let err = d.send("logs.error", &Value::Null, None, -5).unwrap_err();
        assert!(matches!(err, ExchangeError::PayloadRequired));
        assert_eq!(err.to_string(), "message payload cannot be NULL");
    }

    #[test]
    fn test_negative_delay_rejected() {
        let store = Arc::new(ScriptedStore::default());
        let d = dispatcher(&[("#", "q")], store.clone());
        let err = d.send("logs.error", &json!(1), None, -5).unwrap_err();
        assert!(matches!(err, ExchangeError::NegativeDelay(-5)));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delay_is_forwarded() {
        let store = Arc::new(ScriptedStore::default());
        let d = dispatcher(&[("#", "q")], store.clone());
        d.send("logs.error", &json!(1), None, 30).unwrap();
        assert_eq!(*store.calls.lock().unwrap(), vec![("q".to_string(), 30)]);
    }

    #[test]
    fn test_store_failure_surfaces_and_stops() {
        let store = Arc::new(ScriptedStore {
            failing: Some("b"),
            ..Default::default()
        });
        let d = dispatcher(&[("#", "a"), ("#", "b"), ("#", "c")], store.clone());

        let err = d.send("any.key", &json!(1), None, 0).unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Store(StoreError::QueueUnavailable { ref queue, .. }) if queue == "b"
        ));
        // "a" precedes "b" in name order and keeps its copy; "c" is never tried.
        assert_eq!(*store.calls.lock().unwrap(), vec![("a".to_string(), 0)]);
    }

    #[test]
    fn test_each_send_sees_one_snapshot() {
        let registry = Arc::new(BindingRegistry::new());
        registry.bind("#", "a").unwrap();
        let store = Arc::new(ScriptedStore::default());
        let d = Dispatcher::new(Router::new(registry.clone()), store.clone());

        assert_eq!(d.send("k", &json!(1), None, 0).unwrap(), 1);
        registry.bind("#", "b").unwrap();
        assert_eq!(d.send("k", &json!(1), None, 0).unwrap(), 2);
    }
}

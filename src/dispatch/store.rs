//! Queue store collaborator.
//!
//! The exchange only needs two things from a queue store: an enqueue
//! primitive and an existence check. Deletions flow the other way, through
//! `QueueDeletionListener`, so the binding registry can cascade.
//!
//! `MemoryQueueStore` is the in-process store used by the service binary
//! and the tests. Each queue is a FIFO of `StoredMessage`s with a
//! store-wide monotonically increasing message id.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Identifier assigned to every enqueued message.
pub type MessageId = u64;

/// Enqueue side of a queue store.
pub trait QueueStore: Send + Sync {
    /// Append a message to `queue`, visible after `delay_seconds`.
    fn enqueue(
        &self,
        queue: &str,
        payload: &Value,
        headers: Option<&Value>,
        delay_seconds: u64,
    ) -> StoreResult<MessageId>;

    fn queue_exists(&self, queue: &str) -> bool;
}

/// Notified synchronously after a queue has been dropped.
pub trait QueueDeletionListener: Send + Sync {
    fn on_queue_deleted(&self, queue: &str);
}

/// A message with store-assigned metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub payload: Value,
    pub headers: Option<Value>,
    /// Milliseconds since the UNIX epoch.
    pub enqueued_at: u64,
    /// The message is not visible to readers before this instant.
    pub visible_at: u64,
}

impl StoredMessage {
    pub fn is_visible(&self, now_ms: u64) -> bool {
        self.visible_at <= now_ms
    }
}

type Queue = Mutex<VecDeque<StoredMessage>>;

/// In-memory queue store.
#[derive(Default)]
pub struct MemoryQueueStore {
    queues: DashMap<String, Queue>,
    listeners: Mutex<Vec<Arc<dyn QueueDeletionListener>>>,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current time in milliseconds since the UNIX epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `queue`. Returns `false` if it already existed.
    pub fn create_queue(&self, queue: &str) -> bool {
        let mut created = false;
        self.queues.entry(queue.to_string()).or_insert_with(|| {
            created = true;
            Mutex::new(VecDeque::new())
        });
        if created {
            tracing::info!(queue, "Created queue");
        }
        created
    }

    /// Drop `queue` with its messages and notify every listener.
    ///
    /// Returns `false` if the queue did not exist; listeners are not
    /// notified in that case.
    pub fn drop_queue(&self, queue: &str) -> bool {
        let Some((_, messages)) = self.queues.remove(queue) else {
            return false;
        };
        let discarded = lock(&messages).len();
        tracing::info!(queue, discarded, "Dropped queue");

        // Clone out so a listener may subscribe or drop without deadlocking.
        let listeners = lock(&self.listeners).clone();
        for listener in listeners {
            listener.on_queue_deleted(queue);
        }
        true
    }

    /// Register a listener for queue deletions.
    pub fn subscribe(&self, listener: Arc<dyn QueueDeletionListener>) {
        lock(&self.listeners).push(listener);
    }

    /// Up to `limit` visible messages from the head of `queue`, left in place.
    pub fn read(&self, queue: &str, limit: usize) -> StoreResult<Vec<StoredMessage>> {
        let entry = self
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        let now = epoch_ms();
        let messages = lock(entry.value())
            .iter()
            .filter(|m| m.is_visible(now))
            .take(limit)
            .cloned()
            .collect();
        Ok(messages)
    }

    /// Remove and return the oldest visible message of `queue`.
    pub fn pop(&self, queue: &str) -> StoreResult<Option<StoredMessage>> {
        let entry = self
            .queues
            .get(queue)
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))?;
        let now = epoch_ms();
        let mut messages = lock(entry.value());
        let position = messages.iter().position(|m| m.is_visible(now));
        Ok(position.and_then(|i| messages.remove(i)))
    }

    /// Number of messages in `queue`, visible or not.
    pub fn queue_length(&self, queue: &str) -> StoreResult<usize> {
        self.queues
            .get(queue)
            .map(|entry| lock(entry.value()).len())
            .ok_or_else(|| StoreError::QueueNotFound(queue.to_string()))
    }

    /// Queue names in lexical order.
    pub fn list_queues(&self) -> Vec<String> {
        let mut names: Vec<String> = self.queues.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl QueueStore for MemoryQueueStore {
    fn enqueue(
        &self,
        queue: &str,
        payload: &Value,
        headers: Option<&Value>,
        delay_seconds: u64,
    ) -> StoreResult<MessageId> {
        let entry = self.queues.get(queue).ok_or_else(|| StoreError::QueueUnavailable {
            queue: queue.to_string(),
            reason: "queue does not exist".to_string(),
        })?;

        let mut messages = lock(entry.value());
        // Assigned under the queue lock so ids within a queue are ordered.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let enqueued_at = epoch_ms();
        messages.push_back(StoredMessage {
            id,
            payload: payload.clone(),
            headers: headers.cloned(),
            enqueued_at,
            visible_at: enqueued_at.saturating_add(delay_seconds.saturating_mul(1000)),
        });
        tracing::trace!(queue, id, delay_seconds, "Enqueued message");
        Ok(id)
    }

    fn queue_exists(&self, queue: &str) -> bool {
        self.queues.contains_key(queue)
    }
}

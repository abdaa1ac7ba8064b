//! Publish path and queue store collaborator.
//!
//! # Data Flow
//! ```text
//! send(key, payload, headers, delay)
//!     → dispatcher.rs (key grammar → payload → delay)
//!     → Router::route (one snapshot)
//!     → distinct queues
//!     → store.rs QueueStore::enqueue per queue
//!     → Return: number of queues enqueued to
//!
//! drop_queue(name)
//!     → store.rs removes the queue
//!     → QueueDeletionListener::on_queue_deleted (registry cascade)
//! ```

pub mod dispatcher;
pub mod store;

pub use dispatcher::Dispatcher;
pub use store::{MemoryQueueStore, MessageId, QueueDeletionListener, QueueStore, StoredMessage};

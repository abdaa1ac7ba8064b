//! The binding registry.
//!
//! # Responsibilities
//! - Own every binding row, unique per (pattern, queue)
//! - Idempotent bind, reporting unbind, cascading removal per queue
//! - Publish an immutable `RoutingTable` after every change
//! - Save and load binding rows as JSON

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;

use crate::dispatch::store::QueueDeletionListener;
use crate::error::{ExchangeError, ExchangeResult};
use crate::observability::metrics;
use crate::registry::binding::{Binding, BindingKey, BindingRecord};
use crate::routing::RoutingTable;
use crate::topic::validate_topic_pattern;

type Rows = BTreeMap<BindingKey, Arc<Binding>>;

/// Thread-safe store of bindings with lock-free snapshot reads.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    /// Authoritative rows. Held across the whole read-modify-publish cycle.
    rows: Mutex<Rows>,
    /// Latest published snapshot.
    table: ArcSwap<RoutingTable>,
    /// Serializes writers of the bindings file.
    save_lock: Mutex<()>,
}

impl BindingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_rows(&self) -> MutexGuard<'_, Rows> {
        // A panic mid-write cannot leave a torn map: rows are only ever
        // inserted or removed whole.
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild and swap in a snapshot. Called with the row lock held so
    /// snapshots are published in write order.
    fn publish(&self, rows: &Rows) {
        self.table.store(Arc::new(RoutingTable::build(rows.values())));
        metrics::record_binding_count(rows.len());
    }

    /// Bind `pattern` to `queue`.
    ///
    /// Returns `true` if a new row was created and `false` if the pair was
    /// already bound.
    pub fn bind(&self, pattern: &str, queue: &str) -> ExchangeResult<bool> {
        validate_topic_pattern(pattern).inspect_err(|e| {
            metrics::record_validation_failure(e.code());
            tracing::warn!(pattern, queue, error = %e, "Bind rejected");
        })?;
        if queue.is_empty() {
            tracing::warn!(pattern, "Bind rejected: empty queue name");
            return Err(ExchangeError::QueueNameRequired);
        }

        let key = BindingKey::new(pattern, queue);
        let mut rows = self.lock_rows();
        if rows.contains_key(&key) {
            tracing::debug!(pattern, queue, "Binding already present");
            return Ok(false);
        }

        rows.insert(key.clone(), Arc::new(Binding::new(key)));
        self.publish(&rows);
        tracing::info!(pattern, queue, bindings = rows.len(), "Bound topic pattern");
        Ok(true)
    }

    /// Remove the binding of `pattern` to `queue`, returning whether it existed.
    pub fn unbind(&self, pattern: &str, queue: &str) -> bool {
        let key = BindingKey::new(pattern, queue);
        let mut rows = self.lock_rows();
        if rows.remove(&key).is_none() {
            return false;
        }
        self.publish(&rows);
        tracing::info!(pattern, queue, bindings = rows.len(), "Unbound topic pattern");
        true
    }

    /// Remove every binding that targets `queue`, returning how many were removed.
    pub fn remove_queue(&self, queue: &str) -> usize {
        let mut rows = self.lock_rows();
        let before = rows.len();
        rows.retain(|key, _| key.queue != queue);
        let removed = before - rows.len();
        if removed > 0 {
            self.publish(&rows);
            tracing::info!(queue, removed, "Removed bindings of deleted queue");
        }
        removed
    }

    /// The current routing snapshot.
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    pub fn len(&self) -> usize {
        self.lock_rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pattern: &str, queue: &str) -> bool {
        self.lock_rows().contains_key(&BindingKey::new(pattern, queue))
    }

    /// All rows, ordered by (pattern, queue).
    pub fn records(&self) -> Vec<BindingRecord> {
        self.lock_rows().values().map(|b| b.record()).collect()
    }

    /// Rows targeting `queue`, ordered by pattern.
    pub fn records_for_queue(&self, queue: &str) -> Vec<BindingRecord> {
        self.lock_rows()
            .values()
            .filter(|b| b.queue() == queue)
            .map(|b| b.record())
            .collect()
    }

    /// Write every row to `path` as a JSON array.
    ///
    /// Saves are serialized and the rows are read after the save lock is
    /// taken, so the last writer always stores the latest rows. The file is
    /// written to a sibling and renamed into place; readers never observe a
    /// partial array.
    pub fn save_to_file(&self, path: &Path) -> ExchangeResult<()> {
        let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let records = self.records();

        let file_name = path.file_name().ok_or_else(|| {
            ExchangeError::Persistence(format!("'{}' is not a file path", path.display()))
        })?;
        let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

        let mut writer = BufWriter::new(File::create(&tmp).map_err(persistence_error)?);
        serde_json::to_writer_pretty(&mut writer, &records).map_err(persistence_error)?;
        writer.flush().map_err(persistence_error)?;
        let file = writer.into_inner().map_err(|e| persistence_error(e.error()))?;
        file.sync_all().map_err(persistence_error)?;
        drop(file);

        std::fs::rename(&tmp, path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            persistence_error(e)
        })?;
        tracing::info!(path = %path.display(), bindings = records.len(), "Saved bindings");
        Ok(())
    }

    /// Build a registry from a file written by `save_to_file`.
    ///
    /// A missing file yields an empty registry. Each row is validated and
    /// recompiled; a row that fails validation aborts the load.
    pub fn load_from_file(path: &Path) -> ExchangeResult<Self> {
        let registry = Self::new();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(registry),
            Err(e) => return Err(persistence_error(e)),
        };
        let records: Vec<BindingRecord> =
            serde_json::from_reader(BufReader::new(file)).map_err(persistence_error)?;

        {
            let mut rows = registry.lock_rows();
            for (index, record) in records.into_iter().enumerate() {
                validate_topic_pattern(&record.pattern).map_err(|e| {
                    ExchangeError::Persistence(format!("row {index} ('{}'): {e}", record.pattern))
                })?;
                if record.queue.is_empty() {
                    return Err(ExchangeError::Persistence(format!(
                        "row {index} ('{}'): queue name is empty",
                        record.pattern
                    )));
                }

                let key = BindingKey::new(record.pattern, record.queue);
                let binding = Binding::new(key.clone());
                if binding.matcher().canonical() != record.compiled {
                    tracing::warn!(
                        pattern = binding.pattern(),
                        stored = %record.compiled,
                        compiled = binding.matcher().canonical(),
                        "Stored compiled form differs; using recompiled matcher"
                    );
                }
                rows.insert(key, Arc::new(binding));
            }
            registry.publish(&rows);
            tracing::info!(path = %path.display(), bindings = rows.len(), "Loaded bindings");
        }
        Ok(registry)
    }
}

impl QueueDeletionListener for BindingRegistry {
    fn on_queue_deleted(&self, queue: &str) {
        self.remove_queue(queue);
    }
}

fn persistence_error(e: impl std::fmt::Display) -> ExchangeError {
    ExchangeError::Persistence(e.to_string())
}

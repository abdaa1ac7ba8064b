//! Binding registry subsystem.
//!
//! # Data Flow
//! ```text
//! bind(pattern, queue)
//!     → grammar check → compile → upsert row keyed by (pattern, queue)
//!     → rebuild RoutingTable → atomic swap of Arc<RoutingTable>
//!
//! unbind / queue deleted
//!     → remove row(s) → rebuild → swap
//!
//! route(key)
//!     → load current Arc<RoutingTable> (lock-free)
//! ```
//!
//! # Design Decisions
//! - Writers serialize on one mutex; readers never take it
//! - Each write publishes a complete snapshot, so a reader sees either the
//!   state before or after a write, never a torn one
//! - The registry is the only owner of binding rows

pub mod binding;
#[allow(clippy::module_inception)]
pub mod registry;

pub use binding::{Binding, BindingKey, BindingRecord};
pub use registry::BindingRegistry;

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! routing key
//!     → router.rs (load one registry snapshot)
//!     → table.rs (first-segment index → candidate bindings)
//!     → CompiledMatcher::matches per candidate
//!     → Return: every matching (pattern, queue)
//! ```
//!
//! # Design Decisions
//! - All matches are returned; there is no priority or specificity ranking
//! - Deterministic: same snapshot and key always yield the same set
//! - Linear in the number of candidate bindings per call

pub mod router;
pub mod table;

pub use router::{RouteMatch, Router};
pub use table::RoutingTable;

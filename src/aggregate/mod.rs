//! Merge engine producing the immutable configuration snapshot.
//!
//! # Data Flow
//! ```text
//! DataSourceKind[] (configured order)
//!     → aggregator.rs: global_values() of each source, merged in order
//!     → aggregator.rs: values_for_template(name) of each source, per name
//!     → ResolvedConfig (built once, shared via Arc, never mutated)
//! ```
//!
//! # Design Decisions
//! - Sources are queried sequentially; order is part of the merge contract
//! - Shallow merge by default: later source wins per top-level key
//! - The first failing source aborts the build; no partial snapshot exists

pub mod aggregator;
pub mod merge;

use serde_json::{Map, Value};

pub use aggregator::{ConfigAggregator, ResolvedConfig};
pub use merge::merge_into;

/// Nested configuration values keyed by string. Keys iterate in sorted
/// order, which keeps serialized output deterministic.
pub type ConfigTree = Map<String, Value>;

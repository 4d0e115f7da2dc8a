//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request (method, path)
//!     → router.rs (ordered table lookup)
//!     → matcher.rs (method + segment matching, version/param capture)
//!     → Return: RouteMatch { handler, captures } or the not-found fallback
//! ```
//!
//! # Design Decisions
//! - The table is static and immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod matcher;
pub mod router;

pub use matcher::{Captures, Matcher, Segment};
pub use router::{Handler, RouteMatch, Router, ROUTES};

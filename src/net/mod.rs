//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, state machine)
//!     → Hand off to the API layer
//!
//! Connection States:
//!     Listening → ParsingRequest → Dispatching → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - One request per connection; every response closes the socket

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionLifecycle, ConnectionState, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Instantiate sources → List templates → Aggregate
//!     → Bootstrapped { snapshot, template sources } → bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, before the listener is bound
//! - Sources initialize in configured order, not concurrently
//! - Shutdown has timeout: in-flight connections get a bounded drain

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, Bootstrapped, StartupError};

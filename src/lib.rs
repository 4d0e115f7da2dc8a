//! stencil library: configuration aggregation and status API.

// Core subsystems
pub mod aggregate;
pub mod api;
pub mod config;
pub mod routing;
pub mod sources;

// Transport
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use aggregate::{ConfigAggregator, ConfigTree, ResolvedConfig};
pub use api::{ApiServer, AppState};
pub use config::StencilConfig;
pub use lifecycle::{bootstrap, Shutdown};

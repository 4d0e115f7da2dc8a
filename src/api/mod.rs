//! Status API subsystem.
//!
//! # Data Flow
//! ```text
//! accepted TcpStream
//!     → server.rs (worker model, timeout, per-connection error boundary)
//!     → request.rs (request line → method, path, version)
//!     → routing (static table → handler)
//!     → handlers.rs (read snapshot / query template sources)
//!     → response.rs (status line, fixed headers, JSON body)
//!     → socket closed
//! ```
//!
//! # Design Decisions
//! - Hand-rolled HTTP/1.x subset: one request per connection, no keep-alive
//! - Malformed and unroutable requests get the same not-found response
//! - Handler failures become a 500 for that connection only
//! - The API version in the path is captured but does not change response
//!   shape; every version is served with the current schema

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

use thiserror::Error;

use crate::sources::SourceFailure;

pub use handlers::AppState;
pub use request::{Request, RequestError};
pub use response::{Response, Status};
pub use server::ApiServer;

/// Product name sent in the `Server` header.
pub const PRODUCT: &str = "stencil";

/// Current API version.
pub const API_VERSION: u32 = 2;

/// A failure while servicing one connection.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Source(#[from] SourceFailure),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection timed out after {0}s")]
    Timeout(u64),
}

impl ApiError {
    /// Name of the backend that caused the failure, if any.
    pub fn source_name(&self) -> Option<&str> {
        match self {
            Self::Source(failure) => Some(&failure.source_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceError;

    #[test]
    fn source_name_comes_from_the_failing_backend() {
        let failure = SourceFailure::new(
            "consul",
            SourceError::Unreachable {
                source_name: "consul".to_string(),
                reason: "connection refused".to_string(),
            },
        );
        assert_eq!(ApiError::from(failure).source_name(), Some("consul"));
        assert_eq!(ApiError::Timeout(30).source_name(), None);
    }
}

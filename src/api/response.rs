//! Response construction and framing.
//!
//! # Responsibilities
//! - Build JSON responses with a status
//! - Serialize the fixed header block and body
//!
//! # Design Decisions
//! - Every header line is CRLF-terminated, followed by one blank line
//! - `Content-Length` is the body's byte length, not its char count
//! - Every response carries `Connection: close`

use serde::Serialize;
use serde_json::json;

use crate::api::{API_VERSION, PRODUCT};

/// Status codes the API emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "Not Found",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

/// A complete response: status plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    body: String,
}

impl Response {
    /// Serialize `value` as the body.
    pub fn json<T: Serialize + ?Sized>(status: Status, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status,
            body: serde_json::to_string(value)?,
        })
    }

    /// The default response for unroutable and malformed requests.
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            body: json!({ "error": "not found" }).to_string(),
        }
    }

    /// A per-connection failure reported to the client.
    pub fn internal_error(message: &str) -> Self {
        Self {
            status: Status::InternalServerError,
            body: json!({ "error": message }).to_string(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Status line, headers, blank line and body, ready for the socket.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: application/json\r\n\
             Server: {}/{}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.status.code(),
            self.status.reason(),
            PRODUCT,
            API_VERSION,
            self.body.len(),
        );

        let mut bytes = Vec::with_capacity(head.len() + self.body.len());
        bytes.extend_from_slice(head.as_bytes());
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}

//! Request-line parsing.
//!
//! # Responsibilities
//! - Read one bounded request line from the socket
//! - Split it into method, target and protocol
//! - Extract the bare path and the leading `v<N>` API version
//! - Drain the header block so closing the socket does not reset the peer
//!
//! # Design Decisions
//! - Anything short, oversized or non-UTF-8 is `Malformed`; the caller
//!   answers it with the default not-found response
//! - Header contents are never interpreted

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::routing::matcher::parse_version;

/// Longest accepted request or header line, in bytes.
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Most header lines drained after the request line.
pub const MAX_HEADER_LINES: usize = 100;

/// How long draining waits for the next header line.
pub const HEADER_IDLE: Duration = Duration::from_millis(250);

/// Bytes of an offending line kept for diagnostics.
pub const FRAGMENT_BYTES: usize = 64;

/// Errors raised while reading a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request: {reason}")]
    Malformed {
        reason: &'static str,
        /// Leading bytes of the offending line, lossily decoded.
        fragment: String,
    },

    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method token, as sent.
    pub method: String,
    /// Raw request target, including any query string.
    pub target: String,
    /// Target without the query string.
    pub path: String,
    /// Protocol token (`HTTP/1.1`), if sent.
    pub protocol: Option<String>,
    /// API version from a leading `v<N>` segment.
    pub version: Option<u32>,
}

impl Request {
    pub fn new(method: &str, target: &str, protocol: Option<&str>) -> Self {
        let path = target.split('?').next().unwrap_or_default().to_string();
        let version = path
            .strip_prefix('/')
            .and_then(|rest| rest.split('/').next())
            .and_then(parse_version);

        Self {
            method: method.to_string(),
            target: target.to_string(),
            path,
            protocol: protocol.map(str::to_string),
            version,
        }
    }
}

impl RequestError {
    fn malformed(reason: &'static str, raw: &[u8]) -> Self {
        let end = raw.len().min(FRAGMENT_BYTES);
        Self::Malformed {
            reason,
            fragment: String::from_utf8_lossy(&raw[..end])
                .trim_end_matches(['\r', '\n'])
                .to_string(),
        }
    }
}

/// Split a request line into its tokens.
pub fn parse_request_line(line: &str) -> Result<Request, RequestError> {
    let mut tokens = line.split_ascii_whitespace();
    let method = tokens
        .next()
        .ok_or_else(|| RequestError::malformed("empty request line", line.as_bytes()))?;
    let target = tokens
        .next()
        .ok_or_else(|| RequestError::malformed("missing request target", line.as_bytes()))?;
    let protocol = tokens.next();

    Ok(Request::new(method, target, protocol))
}

/// Read and parse the request line.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let line = read_line(reader).await?;
    let line = line.ok_or_else(|| RequestError::malformed("connection closed before request line", b""))?;
    parse_request_line(&line)
}

/// Discard header lines up to the blank line, EOF, or an idle pause.
pub async fn drain_headers<R>(reader: &mut R) -> Result<(), RequestError>
where
    R: AsyncBufRead + Unpin,
{
    for _ in 0..MAX_HEADER_LINES {
        match tokio::time::timeout(HEADER_IDLE, read_line(reader)).await {
            Ok(Ok(Some(line))) if !line.trim().is_empty() => continue,
            Ok(Ok(_)) | Err(_) => return Ok(()),
            Ok(Err(RequestError::Malformed { .. })) => continue,
            Ok(Err(e)) => return Err(e),
        }
    }
    Ok(())
}

/// One line without its terminator, `None` at EOF.
async fn read_line<R>(reader: &mut R) -> Result<Option<String>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES + 1)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Ok(None);
    }
    if buf.len() as u64 > MAX_LINE_BYTES {
        return Err(RequestError::malformed("request line too long", &buf));
    }

    let line = String::from_utf8(buf)
        .map_err(|e| RequestError::malformed("request line is not UTF-8", e.as_bytes()))?;
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[test]
    fn splits_request_line() {
        let req = parse_request_line("GET /v2/template/app.conf?x=1 HTTP/1.1").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/v2/template/app.conf?x=1");
        assert_eq!(req.path, "/v2/template/app.conf");
        assert_eq!(req.protocol.as_deref(), Some("HTTP/1.1"));
        assert_eq!(req.version, Some(2));
    }

    #[test]
    fn tolerates_missing_protocol_and_extra_whitespace() {
        let req = parse_request_line("  GET\t/ping  ").unwrap();
        assert_eq!(req.path, "/ping");
        assert_eq!(req.protocol, None);
        assert_eq!(req.version, None);
    }

    #[test]
    fn short_lines_are_malformed() {
        assert!(matches!(parse_request_line(""), Err(RequestError::Malformed { .. })));
        assert!(matches!(parse_request_line("   "), Err(RequestError::Malformed { .. })));
        match parse_request_line("GET") {
            Err(RequestError::Malformed { reason, fragment }) => {
                assert_eq!(reason, "missing request target");
                assert_eq!(fragment, "GET");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_first_line_and_drains_headers() {
        let raw: &[u8] = b"GET /ping HTTP/1.1\r\nHost: x\r\nAccept: */*\r\n\r\ntrailing";
        let mut reader = BufReader::new(raw);

        let req = read_request(&mut reader).await.unwrap();
        assert_eq!(req.path, "/ping");

        drain_headers(&mut reader).await.unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).await.unwrap();
        assert_eq!(rest, "trailing");
    }

    #[tokio::test]
    async fn eof_before_request_line_is_malformed() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(matches!(
            read_request(&mut reader).await,
            Err(RequestError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn oversized_line_is_malformed() {
        let raw = vec![b'a'; (MAX_LINE_BYTES as usize) + 10];
        let mut reader = BufReader::new(raw.as_slice());
        assert!(matches!(
            read_request(&mut reader).await,
            Err(RequestError::Malformed { reason: "request line too long", ref fragment })
                if fragment.len() == FRAGMENT_BYTES
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_is_malformed() {
        let mut reader = BufReader::new(&b"GET /\xff\xfe HTTP/1.1\r\n"[..]);
        assert!(matches!(
            read_request(&mut reader).await,
            Err(RequestError::Malformed { .. })
        ));
    }
}

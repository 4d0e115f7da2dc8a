//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request method (exact, case-sensitive)
//! - Match the request path segment by segment
//! - Extract the API version and named parameters while matching
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Exact matchers need the segment counts to agree; prefix matchers accept
//!   trailing segments (including a trailing slash) after the pattern
//! - No regex to guarantee O(n) matching

use crate::api::request::Request;

/// Values captured while matching a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    /// `N` from a leading `v<N>` segment.
    pub version: Option<u32>,
    /// Value of the single `{param}` segment.
    pub param: Option<String>,
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the captured values if the request matches.
    fn matches(&self, req: &Request) -> Option<Captures>;
}

/// Matches the request method.
#[derive(Debug, Clone, Copy)]
pub struct MethodMatcher {
    method: &'static str,
}

impl MethodMatcher {
    pub const fn new(method: &'static str) -> Self {
        Self { method }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &Request) -> Option<Captures> {
        (req.method == self.method).then(Captures::default)
    }
}

/// One segment of a path pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the given text.
    Literal(&'static str),
    /// `v` followed by one or more ASCII digits.
    Version,
    /// Any non-empty segment, captured.
    Param,
}

/// Matches a path against a fixed list of segments.
#[derive(Debug, Clone, Copy)]
pub struct PathMatcher {
    segments: &'static [Segment],
    prefix: bool,
}

impl PathMatcher {
    /// Matches exactly `segments`.
    pub const fn new(segments: &'static [Segment]) -> Self {
        Self {
            segments,
            prefix: false,
        }
    }

    /// Matches paths that start with `segments`.
    pub const fn prefix(segments: &'static [Segment]) -> Self {
        Self {
            segments,
            prefix: true,
        }
    }

    /// Match a bare path (no query string).
    pub fn match_path(&self, path: &str) -> Option<Captures> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        let count_ok = if self.prefix {
            parts.len() >= self.segments.len()
        } else {
            parts.len() == self.segments.len()
        };
        if !count_ok {
            return None;
        }

        let mut captures = Captures::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) if *text == part => {}
                Segment::Version => captures.version = Some(parse_version(part)?),
                Segment::Param if !part.is_empty() => captures.param = Some(part.to_string()),
                _ => return None,
            }
        }
        Some(captures)
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &Request) -> Option<Captures> {
        self.match_path(&req.path)
    }
}

/// Parse a `v<digits>` segment. Versions past `u32::MAX` saturate.
pub fn parse_version(segment: &str) -> Option<u32> {
    let digits = segment.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

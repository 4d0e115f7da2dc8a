//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store the static route table
//! - Look up the first matching route for a request
//! - Fall back to the not-found handler
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in table order; first match wins
//! - Explicit not-found handler rather than an error

use crate::api::request::Request;
use crate::routing::matcher::{Captures, Matcher, MethodMatcher, PathMatcher, Segment};

/// Handlers the table can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Ping,
    Config,
    Globals,
    Templates,
    Template,
    NotFound,
}

impl Handler {
    /// Low-cardinality label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Config => "config",
            Self::Globals => "globals",
            Self::Templates => "templates",
            Self::Template => "template",
            Self::NotFound => "not_found",
        }
    }
}

/// One row of the routing table.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: MethodMatcher,
    pub path: PathMatcher,
    pub handler: Handler,
}

impl Route {
    const fn get(segments: &'static [Segment], handler: Handler) -> Self {
        Self {
            method: MethodMatcher::new("GET"),
            path: PathMatcher::new(segments),
            handler,
        }
    }

    /// Like `get`, but trailing path segments are ignored.
    const fn get_prefix(segments: &'static [Segment], handler: Handler) -> Self {
        Self {
            method: MethodMatcher::new("GET"),
            path: PathMatcher::prefix(segments),
            handler,
        }
    }

    fn matches(&self, req: &Request) -> Option<Captures> {
        self.method.matches(req)?;
        self.path.matches(req)
    }
}

/// The API routing table, checked in order.
///
/// `/ping` is exact; versioned endpoints match by prefix.
pub static ROUTES: &[Route] = &[
    Route::get(&[Segment::Literal("ping")], Handler::Ping),
    Route::get_prefix(&[Segment::Version, Segment::Literal("config")], Handler::Config),
    Route::get_prefix(&[Segment::Version, Segment::Literal("globals")], Handler::Globals),
    Route::get_prefix(&[Segment::Version, Segment::Literal("templates")], Handler::Templates),
    Route::get_prefix(
        &[Segment::Version, Segment::Literal("template"), Segment::Param],
        Handler::Template,
    ),
];

/// Result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub handler: Handler,
    pub captures: Captures,
}

impl RouteMatch {
    pub fn not_found() -> Self {
        Self {
            handler: Handler::NotFound,
            captures: Captures::default(),
        }
    }
}

/// Immutable router over a static table.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    routes: &'static [Route],
}

impl Default for Router {
    fn default() -> Self {
        Self { routes: ROUTES }
    }
}

impl Router {
    pub fn new(routes: &'static [Route]) -> Self {
        Self { routes }
    }

    /// First matching route, or the not-found fallback.
    pub fn resolve(&self, req: &Request) -> RouteMatch {
        self.routes
            .iter()
            .find_map(|route| {
                route.matches(req).map(|captures| RouteMatch {
                    handler: route.handler,
                    captures,
                })
            })
            .unwrap_or_else(RouteMatch::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(method: &str, target: &str) -> RouteMatch {
        Router::default().resolve(&Request::new(method, target, Some("HTTP/1.1")))
    }

    #[test]
    fn routes_every_endpoint() {
        assert_eq!(resolve("GET", "/ping").handler, Handler::Ping);
        assert_eq!(resolve("GET", "/v1/config").handler, Handler::Config);
        assert_eq!(resolve("GET", "/v2/globals").handler, Handler::Globals);
        assert_eq!(resolve("GET", "/v1/templates").handler, Handler::Templates);

        let template = resolve("GET", "/v7/template/app.conf");
        assert_eq!(template.handler, Handler::Template);
        assert_eq!(template.captures.version, Some(7));
        assert_eq!(template.captures.param.as_deref(), Some("app.conf"));
    }

    #[test]
    fn query_string_is_ignored() {
        assert_eq!(resolve("GET", "/v1/config?pretty=1").handler, Handler::Config);
    }

    #[test]
    fn falls_back_to_not_found() {
        assert_eq!(resolve("POST", "/ping"), RouteMatch::not_found());
        assert_eq!(resolve("GET", "/config"), RouteMatch::not_found());
        assert_eq!(resolve("GET", "/v1/unknown"), RouteMatch::not_found());
        assert_eq!(resolve("GET", "/ping/extra"), RouteMatch::not_found());
        assert_eq!(resolve("GET", "/"), RouteMatch::not_found());
    }

    #[test]
    fn trailing_segments_reach_versioned_endpoints() {
        assert_eq!(resolve("GET", "/v1/config/").handler, Handler::Config);
        assert_eq!(resolve("GET", "/v1/globals/").handler, Handler::Globals);
        assert_eq!(resolve("GET", "/v1/templates/").handler, Handler::Templates);

        let template = resolve("GET", "/v1/template/a.conf/");
        assert_eq!(template.handler, Handler::Template);
        assert_eq!(template.captures.param.as_deref(), Some("a.conf"));

        let nested = resolve("GET", "/v1/template/a.conf/extra");
        assert_eq!(nested.captures.param.as_deref(), Some("a.conf"));

        assert_eq!(resolve("GET", "/ping/"), RouteMatch::not_found());
        assert_eq!(resolve("GET", "/v1/template/"), RouteMatch::not_found());
    }

    #[test]
    fn version_is_captured_but_not_restricted() {
        assert_eq!(resolve("GET", "/v999/config").captures.version, Some(999));
        assert_eq!(resolve("GET", "/v99999999999/config").handler, Handler::Config);
        assert_eq!(resolve("GET", "/ping").captures.version, None);
    }
}

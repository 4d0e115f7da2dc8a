//! Endpoint handlers.
//!
//! Handlers only read the shared state. Template listings and bodies are
//! fetched from the sources on every call; the snapshot never changes.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::aggregate::ResolvedConfig;
use crate::api::response::{Response, Status};
use crate::api::{ApiError, API_VERSION, PRODUCT};
use crate::routing::{Handler, RouteMatch};
use crate::sources::template::{fetch_first, list_all};
use crate::sources::TemplateSourceKind;

/// Read-only state shared by every connection.
#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: Arc<ResolvedConfig>,
    pub templates: Arc<[TemplateSourceKind]>,
}

impl AppState {
    pub fn new(snapshot: Arc<ResolvedConfig>, templates: Arc<[TemplateSourceKind]>) -> Self {
        Self {
            snapshot,
            templates,
        }
    }
}

#[derive(Serialize)]
pub struct TemplateBody<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

/// Run the handler selected by the router.
pub async fn dispatch(state: &AppState, route: &RouteMatch) -> Result<Response, ApiError> {
    if let Some(version) = route.captures.version {
        tracing::debug!(api_version = version, handler = route.handler.as_str(), "Versioned request");
    }

    match route.handler {
        Handler::Ping => ping(),
        Handler::Config => config(state),
        Handler::Globals => globals(state),
        Handler::Templates => templates(state).await,
        Handler::Template => match route.captures.param.as_deref() {
            Some(name) => template(state, name).await,
            None => Ok(Response::not_found()),
        },
        Handler::NotFound => Ok(Response::not_found()),
    }
}

/// Liveness; independent of the snapshot.
pub fn ping() -> Result<Response, ApiError> {
    let message = format!("{} API v{} OK", PRODUCT, API_VERSION);
    Ok(Response::json(Status::Ok, &json!({ "ping": message }))?)
}

/// The full resolved configuration.
pub fn config(state: &AppState) -> Result<Response, ApiError> {
    Ok(Response::json(Status::Ok, state.snapshot.as_ref())?)
}

/// The global snapshot only.
pub fn globals(state: &AppState) -> Result<Response, ApiError> {
    Ok(Response::json(Status::Ok, state.snapshot.global_config())?)
}

/// Union of every template source's current listing.
pub async fn templates(state: &AppState) -> Result<Response, ApiError> {
    let names = list_all(&state.templates[..]).await?;
    Ok(Response::json(Status::Ok, &names)?)
}

/// One template body, verbatim.
pub async fn template(state: &AppState, name: &str) -> Result<Response, ApiError> {
    match fetch_first(&state.templates[..], name).await? {
        Some(content) => Ok(Response::json(
            Status::Ok,
            &TemplateBody {
                name,
                content: &content,
            },
        )?),
        None => {
            tracing::debug!(template = %name, "Template not found in any source");
            Ok(Response::not_found())
        }
    }
}

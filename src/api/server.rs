//! Status API server.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Run each connection under the configured worker model
//! - Read one request, dispatch it, write one response, close
//! - Contain handler failures to the connection that raised them
//! - Stop accepting on shutdown and drain in-flight connections
//!
//! # Design Decisions
//! - `serial` serves connections inline on the accept task
//! - `per_connection` spawns a task that owns the connection permit
//! - The whole exchange is bounded by `request_timeout_secs`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::api::handlers::{dispatch, AppState};
use crate::api::request::{drain_headers, read_request, RequestError};
use crate::api::response::Response;
use crate::api::ApiError;
use crate::config::{ApiConfig, WorkerModel};
use crate::net::{ConnectionGuard, ConnectionId, ConnectionLifecycle, ConnectionState, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::{Handler, RouteMatch, Router};

/// What every connection needs, shared across tasks.
#[derive(Debug)]
struct Shared {
    state: AppState,
    router: Router,
    request_timeout: Duration,
}

/// The status API server.
#[derive(Debug)]
pub struct ApiServer {
    config: ApiConfig,
    shared: Arc<Shared>,
    tracker: ConnectionTracker,
}

impl ApiServer {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        let shared = Arc::new(Shared {
            state,
            router: Router::default(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        });
        Self {
            config,
            shared,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Handle on the in-flight connection count.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        let address = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(
            address = %address,
            worker_model = ?self.config.worker_model,
            max_connections = listener.max_connections(),
            "API server listening"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(ListenerError::Accept(e)) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let guard = self.tracker.track();
                    let shared = Arc::clone(&self.shared);
                    match self.config.worker_model {
                        WorkerModel::Serial => {
                            handle_connection(stream, peer, shared, guard).await;
                            drop(permit);
                        }
                        WorkerModel::PerConnection => {
                            tokio::spawn(async move {
                                handle_connection(stream, peer, shared, guard).await;
                                drop(permit);
                            });
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let drain = Duration::from_secs(self.config.drain_timeout_secs);
        let in_flight = self.tracker.active_count();
        if in_flight > 0 {
            tracing::info!(in_flight, drain_timeout_secs = drain.as_secs(), "Draining connections");
        }
        if tokio::time::timeout(drain, self.tracker.wait_for_shutdown()).await.is_err() {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timeout elapsed with connections still open"
            );
        }

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// Serve one connection, logging instead of propagating any failure.
async fn handle_connection(stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>, guard: ConnectionGuard) {
    let id = guard.id();
    let span = tracing::info_span!("connection", connection_id = %id, peer = %peer);

    async move {
        let limit = shared.request_timeout;
        let outcome = match tokio::time::timeout(limit, serve_connection(stream, &shared, id)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(limit.as_secs())),
        };
        if let Err(e) = outcome {
            tracing::warn!(error = %e, "Connection aborted");
        }
        drop(guard);
    }
    .instrument(span)
    .await
}

/// One request, one response, then close.
async fn serve_connection(stream: TcpStream, shared: &Shared, id: ConnectionId) -> Result<(), ApiError> {
    let start = Instant::now();
    let mut lifecycle = ConnectionLifecycle::new(id);
    let mut reader = BufReader::new(stream);

    lifecycle.advance(ConnectionState::ParsingRequest);
    let (route, method, path) = match read_request(&mut reader).await {
        Ok(request) => {
            tracing::debug!(method = %request.method, path = %request.path, "Request received");
            let route = shared.router.resolve(&request);
            if route.handler == Handler::NotFound {
                tracing::debug!(method = %request.method, path = %request.path, "No route matched");
            }
            (route, request.method, request.path)
        }
        Err(RequestError::Malformed { reason, fragment }) => {
            tracing::warn!(reason, fragment = %fragment, "Malformed request");
            (RouteMatch::not_found(), String::from("-"), String::from("-"))
        }
        Err(RequestError::Io(e)) => return Err(e.into()),
    };
    if let Err(e) = drain_headers(&mut reader).await {
        tracing::debug!(error = %e, "Header drain stopped early");
    }

    lifecycle.advance(ConnectionState::Dispatching);
    let response = match dispatch(&shared.state, &route).await {
        Ok(response) => response,
        Err(e) => {
            let source = e.source_name().unwrap_or("-");
            tracing::error!(
                method = %method,
                path = %path,
                handler = route.handler.as_str(),
                source = %source,
                error = %e,
                "Request failed"
            );
            if let Some(source) = e.source_name() {
                metrics::record_source_error(source);
            }
            Response::internal_error(&e.to_string())
        }
    };

    lifecycle.advance(ConnectionState::Responding);
    let socket = reader.get_mut();
    socket.write_all(&response.to_bytes()).await?;
    socket.flush().await?;
    if let Err(e) = socket.shutdown().await {
        tracing::trace!(error = %e, "Socket shutdown failed");
    }
    lifecycle.advance(ConnectionState::Closed);

    let status = response.status().code();
    metrics::record_request(route.handler.as_str(), status, start);
    tracing::info!(
        method = %method,
        path = %path,
        handler = route.handler.as_str(),
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request served"
    );
    Ok(())
}

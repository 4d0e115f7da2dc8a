//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use stencil::api::{ApiServer, AppState};
use stencil::config::StencilConfig;
use stencil::lifecycle::{bootstrap, Shutdown};
use stencil::net::Listener;

/// A running API server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    /// Stop accepting and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Bootstrap `config` and serve it on 127.0.0.1 with a random port.
pub async fn start_server(config: StencilConfig) -> TestServer {
    let booted = bootstrap(&config).await.unwrap();

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, config.api.max_connections);
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = ApiServer::new(config.api.clone(), AppState::new(booted.snapshot, booted.templates));
    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    TestServer { addr, shutdown, handle }
}

/// Write `raw` to the server and read until it closes the socket.
pub async fn raw_request(addr: SocketAddr, raw: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

/// `GET path` with a typical header block.
pub async fn get(addr: SocketAddr, path: &str) -> String {
    let raw = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\n\r\n",
        path, addr
    );
    raw_request(addr, raw.as_bytes()).await
}

/// Split a raw response into status code and body.
pub fn parse_response(raw: &str) -> (u16, String) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    (status, body.to_string())
}

/// A scriptable stand-in for a Consul agent's KV endpoint.
///
/// Responses are keyed by request path without the query string. Listing
/// requests end in `/`. Unknown paths answer 404.
#[derive(Clone)]
pub struct MockConsul {
    pub addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, (u16, String)>>>,
}

impl MockConsul {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<HashMap<String, (u16, String)>>> = Arc::default();

        let shared = Arc::clone(&routes);
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let routes = Arc::clone(&shared);
                        tokio::spawn(async move {
                            serve_kv(socket, routes).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, routes }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `path` with `status` and `body` from now on.
    pub fn set(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    /// Serve `keys` as the listing for `prefix` and each key's raw value.
    pub fn put_folder(&self, prefix: &str, entries: &[(&str, &str)]) {
        let prefix = prefix.trim_matches('/');
        let keys: Vec<String> = entries
            .iter()
            .map(|(name, _)| format!("{}/{}", prefix, name))
            .collect();
        self.set(
            &format!("/v1/kv/{}/", prefix),
            200,
            serde_json::to_string(&keys).unwrap(),
        );
        for (name, value) in entries {
            self.set(&format!("/v1/kv/{}/{}", prefix, name), 200, *value);
        }
    }
}

async fn serve_kv(socket: TcpStream, routes: Arc<Mutex<HashMap<String, (u16, String)>>>) {
    let mut reader = BufReader::new(socket);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header).await {
            Ok(0) | Err(_) => break,
            Ok(_) if header.trim().is_empty() => break,
            Ok(_) => continue,
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target).to_string();
    let (status, body) = routes
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((404, String::new()));

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let socket = reader.get_mut();
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

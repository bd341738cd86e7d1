//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;

use contact_handlers::config::ServiceConfig;
use contact_handlers::services::{MemoryEmailSender, MemoryObjectStore, MemoryRecordStore};
use contact_handlers::{AppState, Collaborators, HttpServer, Shutdown};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const IMAGE_URL: &str = "https://res.cloudinary.com/demo/image/upload/bridge.png";
/// Oneshot requests arrive from here unless the harness says otherwise.
pub const LOCAL_PROXY: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40_000);

/// In-memory collaborators with typed handles for assertions.
pub struct Harness {
    pub objects: Arc<MemoryObjectStore>,
    pub records: Arc<MemoryRecordStore>,
    pub email: Arc<MemoryEmailSender>,
    pub state: AppState,
    pub router: Router,
    peer: SocketAddr,
}

pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.admin.api_key = ADMIN_KEY.to_string();
    config.security.trusted_proxies = vec![LOCAL_PROXY.ip()];
    config
}

impl Harness {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_peer(config, LOCAL_PROXY)
    }

    /// Harness whose oneshot requests come from `peer`.
    pub fn with_peer(config: ServiceConfig, peer: SocketAddr) -> Self {
        let objects = Arc::new(MemoryObjectStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let email = Arc::new(MemoryEmailSender::new());
        let services = Collaborators {
            objects: objects.clone(),
            records: records.clone(),
            email: email.clone(),
        };
        let server = HttpServer::new(config, services);
        Self {
            objects,
            records,
            email,
            state: server.state().clone(),
            router: server.router(),
            peer,
        }
    }

    pub fn submissions(&self) -> Vec<Value> {
        self.records.items(&self.state.config().storage.submissions_table)
    }

    pub fn projects(&self) -> Vec<Value> {
        self.records.items(&self.state.config().storage.projects_table)
    }

    pub async fn send(&self, mut request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        if request.extensions().get::<ConnectInfo<SocketAddr>>().is_none() {
            request.extensions_mut().insert(ConnectInfo(self.peer));
        }
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }
}

pub fn submit_request(client: &str, body: &Value) -> Request<Body> {
    Request::post("/api/submit")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-admin-key", ADMIN_KEY);
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// Serve `config` on an ephemeral port. Returns the address and the shutdown
/// handle that stops the server.
pub async fn start_server(config: ServiceConfig) -> (SocketAddr, Shutdown, Harness) {
    let harness = Harness::new(config);
    let server = HttpServer::from_state(harness.state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (_, config_updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown, harness)
}

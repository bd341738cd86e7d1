//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Gate project writes behind the admin key
//! - Apply configuration reloads to the running state
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::auth::admin_auth_middleware;
use crate::admin::handlers::{create_project, delete_project, update_project};
use crate::config::ServiceConfig;
use crate::http::response::{
    allow_credentials, allow_headers, allow_methods, allow_origin, preflight,
};
use crate::projects::list_projects;
use crate::security::SlidingWindowLimiter;
use crate::services::Collaborators;
use crate::submissions::{list_submissions, submit, IdempotencyCache};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ArcSwap<ServiceConfig>>,
    pub limiter: Arc<SlidingWindowLimiter>,
    pub idempotency: Arc<IdempotencyCache>,
    pub services: Collaborators,
}

impl AppState {
    pub fn new(config: ServiceConfig, services: Collaborators) -> Self {
        Self::with_limiter(
            SlidingWindowLimiter::new(&config.rate_limit),
            config,
            services,
        )
    }

    /// State with a caller built limiter (custom clock or store).
    pub fn with_limiter(
        limiter: SlidingWindowLimiter,
        config: ServiceConfig,
        services: Collaborators,
    ) -> Self {
        let idempotency = IdempotencyCache::new(&config.idempotency);
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            limiter: Arc::new(limiter),
            idempotency: Arc::new(idempotency),
            services,
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<ServiceConfig> {
        self.config.load_full()
    }

    /// Swap in a reloaded configuration.
    pub fn apply_config(&self, config: ServiceConfig) {
        self.limiter.reconfigure(&config.rate_limit);
        self.idempotency.reconfigure(&config.idempotency);
        self.config.store(Arc::new(config));
        tracing::info!("Configuration reloaded");
    }
}

/// HTTP server for the contact handlers.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and collaborators.
    pub fn new(config: ServiceConfig, services: Collaborators) -> Self {
        Self::from_state(AppState::new(config, services))
    }

    pub fn from_state(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServiceConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply_config(config);
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
///
/// Timeout and body limit come from the configuration at build time; a reload
/// does not resize them.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config();
    let admin = middleware::from_fn_with_state(state.clone(), admin_auth_middleware);

    let listing = Router::new()
        .route("/api/submissions", get(list_submissions).options(preflight))
        .layer(allow_credentials());

    Router::new()
        .route("/api/health", get(health))
        .route("/api/submit", post(submit).options(preflight))
        .route(
            "/api/projects",
            get(list_projects)
                .options(preflight)
                .merge(post(create_project).route_layer(admin.clone())),
        )
        .route(
            "/api/projects/{id}",
            put(update_project)
                .delete(delete_project)
                .route_layer(admin)
                .options(preflight),
        )
        .merge(listing)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        // Wraps the limits so their 408 and 413 responses carry CORS headers too.
        .layer(allow_headers())
        .layer(allow_methods())
        .layer(allow_origin())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

//! Confluence OAuth Proxy
//!
//! Single-binary service that lets a browser client read Confluence Cloud
//! without handling OAuth itself:
//! 1. `/auth/authorize` + `/auth/callback` run the Atlassian authorization
//!    code flow and store the token and cloud id in session cookies
//! 2. `/pages/space/{key}` and `/pages/{id}` proxy read-only Confluence calls
//!    for sessions carrying those cookies

mod auth;
mod config;
mod error;
mod metrics;
mod pages;
mod session;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{Instrument, error, info, info_span, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlassian_auth::{OAuthClient, PendingAuthorizations};
use confluence::ConfluenceClient;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::RedirectPolicy;
use crate::config::Config;
use crate::session::CookieSettings;

/// Time allowed for in-flight requests after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) oauth: Arc<OAuthClient>,
    pub(crate) pending: Arc<PendingAuthorizations>,
    pub(crate) confluence: ConfluenceClient,
    pub(crate) redirects: RedirectPolicy,
    pub(crate) cookies: CookieSettings,
    pub(crate) prometheus: PrometheusHandle,
    pub(crate) started_at: Instant,
}

/// Build the axum router with all routes and shared state.
///
/// The `/pages` handlers take a `Session`, whose extraction redirects
/// requests without a token cookie to login.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/auth/authorize", get(auth::authorize))
        .route("/auth/callback", get(auth::callback))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/pages/space/{space_key}", get(pages::pages_in_space))
        .route("/pages/{page_id}", get(pages::page_by_id))
        .layer(middleware::from_fn(track_requests))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting confluence-proxy");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    match &config_path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => info!("no configuration file, using defaults and environment"),
    }

    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;
    let secure_cookies = config.secure_cookies();

    info!(
        listen_addr = %config.server.listen_addr,
        confluence_api_url = %config.confluence.api_url,
        token_url = %config.oauth.token_url,
        timeout_secs = config.server.timeout_secs,
        restrict_redirects = config.server.restrict_redirects,
        "configuration loaded"
    );

    let timeout = Duration::from_secs(config.server.timeout_secs);
    let http = reqwest::Client::new();

    let confluence = ConfluenceClient::new(
        http.clone(),
        &config.confluence.api_url,
        &config.confluence.cloud_id_url,
        timeout,
    )
    .context("invalid Confluence endpoint configuration")?;
    let oauth =
        OAuthClient::new(config.oauth, http, timeout).context("invalid OAuth configuration")?;

    let app_state = AppState {
        oauth: Arc::new(oauth),
        pending: Arc::new(PendingAuthorizations::new(
            Duration::from_secs(config.server.state_ttl_secs),
            config.server.max_pending_states,
        )),
        confluence,
        redirects: RedirectPolicy {
            restrict: config.server.restrict_redirects,
        },
        cookies: CookieSettings {
            secure: secure_cookies,
        },
        prometheus: prometheus_handle,
        started_at: Instant::now(),
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires: the server is
    // told to drain, then the drain is raced against DRAIN_TIMEOUT.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Tag every request with a request id span and record Prometheus metrics.
async fn track_requests(request: Request, next: Next) -> Response {
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    let method = request.method().clone();
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span).await;
    metrics::record_request(
        response.status().as_u16(),
        method.as_str(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Liveness plus the number of logins waiting for their callback.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "pending_authorizations": state.pending.len().await,
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

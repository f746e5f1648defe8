//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the Axum router with the fetch and status handlers
//! - Wire up middleware (tracing, request timeout)
//! - Map guarded-call outcomes to HTTP responses
//!
//! # Design Decisions
//! - A rejected call answers 503 with the rejection reason and, when the
//!   cooldown remaining is known, a Retry-After header
//! - A failed attempt answers 502: the upstream was contacted and failed
//! - The caller can always tell "upstream failed" from "circuit open"

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::breaker::{BreakerRegistry, CallOutcome, CircuitGuard, RejectReason};
use crate::config::GatewayConfig;
use crate::executor::HttpExecutor;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream name → URL.
    pub upstreams: Arc<HashMap<String, String>>,
    pub registry: Arc<BreakerRegistry>,
    pub executor: Arc<HttpExecutor>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let upstreams: HashMap<String, String> = config
            .upstreams
            .iter()
            .map(|u| (u.name.clone(), u.url.clone()))
            .collect();

        let state = AppState {
            upstreams: Arc::new(upstreams),
            registry: Arc::new(BreakerRegistry::new(config.breaker.clone())),
            executor: Arc::new(HttpExecutor::new(&config.timeouts)?),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/fetch/{name}", get(fetch_handler))
            .route("/breakers", get(breakers_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs + 1,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstreams = self.config.upstreams.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Guarded fetch of a configured upstream.
async fn fetch_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let url = match state.upstreams.get(&name) {
        Some(url) => url.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "unknown_upstream", "name": name })),
            )
                .into_response();
        }
    };

    let key = BreakerRegistry::endpoint_key("GET", &url);
    let breaker = state.registry.get(&key);
    let guard = CircuitGuard::new(breaker, state.executor.clone());

    tracing::debug!(upstream = %name, url = %url, "Fetching through circuit breaker");

    match guard.call(&url).await {
        CallOutcome::Success(payload) => (StatusCode::OK, Json(payload)).into_response(),

        CallOutcome::Failed(error) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "upstream_failed",
                "upstream": name,
                "detail": error.to_string(),
            })),
        )
            .into_response(),

        CallOutcome::Rejected(RejectReason::CooldownActive { retry_in }) => {
            let retry_secs = retry_in.as_secs().max(1);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(json!({
                    "error": "circuit_open",
                    "upstream": name,
                    "retry_in_ms": retry_in.as_millis() as u64,
                })),
            )
                .into_response()
        }

        CallOutcome::Rejected(RejectReason::ProbeInFlight) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "probe_in_flight",
                "upstream": name,
            })),
        )
            .into_response(),
    }
}

/// Status of every breaker the registry has created.
async fn breakers_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.registry.snapshot().await;

    let breakers: Vec<serde_json::Value> = snapshot
        .into_iter()
        .map(|(endpoint, status)| {
            let mut entry = json!({
                "endpoint": endpoint,
                "state": status.state,
                "failure_count": status.failure_count,
            });
            if let Some(retry_in_ms) = status.retry_in_ms {
                entry["retry_in_ms"] = json!(retry_in_ms);
            }
            entry
        })
        .collect();

    Json(json!({ "breakers": breakers })).into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}

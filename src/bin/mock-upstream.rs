//! Flaky mock upstream for exercising the gateway by hand.
//!
//! Answers `{"message": "OK"}` on `/`, but can be told to fail the first N
//! requests, or every Nth request, with a 500.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use clap::Parser;
use serde_json::json;

#[derive(Parser)]
#[command(name = "mock-upstream")]
#[command(about = "Flaky upstream server for testing the breaker gateway", long_about = None)]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 3333)]
    port: u16,

    /// Fail the first N requests with a 500.
    #[arg(long, default_value_t = 0)]
    failures: u64,

    /// After the initial failures, fail every Nth request (0 = never).
    #[arg(long, default_value_t = 0)]
    fail_every: u64,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<AtomicU64>,
    failures: u64,
    fail_every: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let state = MockState {
        requests: Arc::new(AtomicU64::new(0)),
        failures: cli.failures,
        fail_every: cli.fail_every,
    };

    let app = Router::new().route("/", get(handler)).with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    println!("Mock upstream listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn handler(State(state): State<MockState>) -> impl IntoResponse {
    let n = state.requests.fetch_add(1, Ordering::SeqCst) + 1;

    let fail = n <= state.failures
        || (state.fail_every > 0 && n % state.fail_every == 0);

    if fail {
        println!("request {}: failing", n);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "simulated failure", "request": n })),
        )
    } else {
        println!("request {}: ok", n);
        (StatusCode::OK, Json(json!({ "message": "OK", "request": n })))
    }
}

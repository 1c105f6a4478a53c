//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::graph::GraphIndex;
use crate::market::MarketRegistry;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Whether the ingress is accepting streams.
    ready: Arc<AtomicBool>,
    /// Graph index handle for market/triangle counts.
    index: Arc<GraphIndex>,
    /// Registry handle for the status report.
    registry: Arc<MarketRegistry>,
}

impl AppState {
    /// Create state over shared component handles.
    pub fn new(index: Arc<GraphIndex>, registry: Arc<MarketRegistry>) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            index,
            registry,
        }
    }

    /// Set the ready flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check the ready flag.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the ingress is accepting streams.
    pub ready: bool,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Number of markets discovered.
    pub markets: usize,
    /// Number of registered fee schedules.
    pub registered_markets: usize,
    /// Number of triangles discovered.
    pub triangles: usize,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness handler - 200 once the ingress is listening, 503 before.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let response = ReadyResponse { ready: is_ready };
    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - counts from the graph index and registry.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.is_ready() { "running" } else { "starting" };
    Json(StatusResponse {
        status,
        markets: state.index.market_count(),
        registered_markets: state.registry.market_count(),
        triangles: state.index.triangle_count(),
    })
}

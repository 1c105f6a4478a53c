//! HTTP API route definitions.

use axum::{routing::get, Router};

use super::handlers::{health, ready, status, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/v1/status", get(status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::GraphIndex;
    use crate::market::{Market, MarketRegistry};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::new(
            Arc::new(GraphIndex::new()),
            Arc::new(MarketRegistry::new()),
        )
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = create_router(state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_endpoint_tracks_flag() {
        let state = state();
        let app = create_router(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.set_ready(true);
        let app = create_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn status_reports_counts() {
        let index = Arc::new(GraphIndex::new());
        let registry = Arc::new(MarketRegistry::new());
        for m in [
            Market::new("BINANCE", "BTCUSDT", "BTC", "USDT"),
            Market::new("BINANCE", "ETHUSDT", "ETH", "USDT"),
            Market::new("BINANCE", "ETHBTC", "ETH", "BTC"),
        ] {
            registry.upsert_market(m.clone());
            index.add_market(m);
        }

        let app = create_router(AppState::new(index, registry));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["markets"], 3);
        assert_eq!(body["registered_markets"], 3);
        assert_eq!(body["triangles"], 1);
        assert_eq!(body["status"], "starting");
    }
}

//! API route handlers for the gateway.

use axum::{Json, extract::State, http::StatusCode};
use cartwatch_core::CartSnapshot;
use cartwatch_scheduler::{ResolveOutcome, TrackOutcome};
use serde_json::{Value, json};
use std::sync::Arc;

use super::server::AppState;

type Reply = (StatusCode, Json<Value>);

fn reply(status: StatusCode, message: impl Into<String>) -> Reply {
    (
        status,
        Json(json!({ "ok": status.is_success(), "message": message.into() })),
    )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let (tracked, resolved) = state.tracker.registry().counts();
    Json(json!({
        "status": "ok",
        "service": "cartwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "carts": { "tracked": tracked, "resolved": resolved },
    }))
}

/// Start tracking a cart. Body: `{"cart": {"token": "...", "items": [...], ...}}`.
pub async fn track_cart(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Reply {
    let cart = &body["cart"];
    let token = cart["token"].as_str().unwrap_or("");
    if !cart.is_object() || token.trim().is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Cart data or token is missing.");
    }

    let snapshot: CartSnapshot = match serde_json::from_value(cart.clone()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("⚠️ Rejected malformed cart {}: {}", token, e);
            return reply(StatusCode::BAD_REQUEST, format!("Malformed cart data: {e}"));
        }
    };

    match state.tracker.track(token, snapshot) {
        Ok(TrackOutcome::Started) => reply(StatusCode::OK, "Cart tracking started."),
        Ok(TrackOutcome::AlreadyTracked) => reply(StatusCode::OK, "Cart already being tracked."),
        Err(e) => reply(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// Mark a cart as checked out. Body: `{"cartToken": "..."}`.
pub async fn checkout_started(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Reply {
    let token = body["cartToken"]
        .as_str()
        .or_else(|| body["token"].as_str())
        .unwrap_or("");
    if token.trim().is_empty() {
        return reply(StatusCode::BAD_REQUEST, "Cart token is missing.");
    }

    match state.tracker.checkout_started(token) {
        Ok(ResolveOutcome::Resolved) => reply(StatusCode::OK, "Checkout status updated."),
        Ok(ResolveOutcome::AlreadyResolved) => reply(StatusCode::OK, "Checkout already recorded."),
        Ok(ResolveOutcome::NotFound) => reply(StatusCode::NOT_FOUND, "Cart not found."),
        Err(e) => reply(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// List live cart records.
pub async fn list_carts(State(state): State<Arc<AppState>>) -> Json<Value> {
    let carts: Vec<Value> = state
        .tracker
        .registry()
        .list()
        .into_iter()
        .map(|r| {
            json!({
                "token": r.token,
                "state": r.state,
                "total": r.snapshot.total_display(),
                "items": r.snapshot.items_summary(),
                "age_secs": r.age().num_seconds(),
                "created_at": r.created_at,
                "resolved_at": r.resolved_at,
            })
        })
        .collect();
    Json(json!({ "count": carts.len(), "carts": carts }))
}

/// Recent delivery outcomes.
pub async fn list_deliveries(State(state): State<Arc<AppState>>) -> Json<Value> {
    let events = state.tracker.events().history();
    Json(json!({ "count": events.len(), "deliveries": events }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cartwatch_core::config::GatewayConfig;
    use cartwatch_core::{LeadSink, Result};
    use cartwatch_scheduler::{CartTracker, Timings};
    use std::time::Duration;

    struct NullSink;

    #[async_trait]
    impl LeadSink for NullSink {
        fn name(&self) -> &str {
            "null"
        }

        async fn deliver(&self, _cart_token: &str, _snapshot: &CartSnapshot) -> Result<()> {
            Ok(())
        }
    }

    fn test_state() -> Arc<AppState> {
        let tracker = CartTracker::new(
            Arc::new(NullSink),
            Timings {
                grace_period: Duration::from_secs(3600),
                retention: Duration::from_secs(300),
            },
        );
        Arc::new(AppState::new(GatewayConfig::default(), tracker))
    }

    fn cart_body(token: &str) -> Json<Value> {
        Json(json!({
            "cart": {
                "token": token,
                "total_price": 5000,
                "items": [{ "title": "Shirt", "quantity": 2 }]
            }
        }))
    }

    #[tokio::test]
    async fn test_health_check() {
        let json = health_check(State(test_state())).await.0;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["carts"]["tracked"], 0);
    }

    #[tokio::test]
    async fn test_track_cart() {
        let state = test_state();
        let (status, json) = track_cart(State(state.clone()), cart_body("A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.0["message"], "Cart tracking started.");

        let (status, json) = track_cart(State(state.clone()), cart_body("A")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.0["message"], "Cart already being tracked.");
        assert_eq!(state.tracker.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_track_cart_missing_token() {
        let state = test_state();
        let (status, json) = track_cart(State(state.clone()), cart_body("")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json.0["ok"], false);

        let (status, _) = track_cart(State(state.clone()), Json(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.tracker.registry().is_empty());
    }

    #[tokio::test]
    async fn test_tokens_not_normalized() {
        let state = test_state();
        track_cart(State(state.clone()), cart_body(" A")).await;
        let (_, json) = track_cart(State(state.clone()), cart_body("A")).await;
        assert_eq!(json.0["message"], "Cart tracking started.");
        assert_eq!(state.tracker.registry().len(), 2);

        let (status, _) = track_cart(State(state.clone()), cart_body("   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            checkout_started(State(state.clone()), Json(json!({ "cartToken": " A" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.tracker.registry().peek("A").unwrap().is_tracked());
    }

    #[tokio::test]
    async fn test_track_cart_malformed() {
        let state = test_state();
        let body = Json(json!({ "cart": { "token": "A", "items": "not-a-list" } }));
        let (status, _) = track_cart(State(state.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.tracker.registry().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_started() {
        let state = test_state();
        track_cart(State(state.clone()), cart_body("A")).await;

        let (status, json) =
            checkout_started(State(state.clone()), Json(json!({ "cartToken": "A" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.0["message"], "Checkout status updated.");

        let (status, json) =
            checkout_started(State(state.clone()), Json(json!({ "cartToken": "A" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.0["message"], "Checkout already recorded.");
    }

    #[tokio::test]
    async fn test_checkout_unknown_cart() {
        let state = test_state();
        let (status, json) = checkout_started(
            State(state.clone()),
            Json(json!({ "cartToken": "unknown-token" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json.0["message"], "Cart not found.");
        assert!(state.tracker.registry().is_empty());

        let (status, _) = checkout_started(State(state), Json(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_carts_and_deliveries() {
        let state = test_state();
        track_cart(State(state.clone()), cart_body("A")).await;

        let json = list_carts(State(state.clone())).await.0;
        assert_eq!(json["count"], 1);
        assert_eq!(json["carts"][0]["token"], "A");
        assert_eq!(json["carts"][0]["state"]["state"], "tracked");
        assert_eq!(json["carts"][0]["total"], "50.00");

        let json = list_deliveries(State(state)).await.0;
        assert_eq!(json["count"], 0);
    }

    #[tokio::test]
    async fn test_router_serves_track_cart() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let app = crate::server::build_router_from_arc(test_state());
        let req = Request::builder()
            .method("POST")
            .uri("/api/track-cart")
            .header("content-type", "application/json")
            .body(Body::from(cart_body("R").0.to_string()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_router_cors_restricted_origin() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let tracker = test_state().tracker.clone();
        let config = GatewayConfig {
            allowed_origins: vec!["https://shop.example.com".into()],
            ..Default::default()
        };
        let app = crate::server::build_router(AppState::new(config, tracker));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/track-cart")
            .header("origin", "https://shop.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let headers = resp.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://shop.example.com"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
    }

    #[tokio::test]
    async fn test_router_cors_any_origin_without_credentials() {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let app = crate::server::build_router_from_arc(test_state());
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/track-cart")
            .header("origin", "https://anywhere.example.org")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let headers = resp.headers();
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert!(headers.get("access-control-allow-credentials").is_none());
    }
}

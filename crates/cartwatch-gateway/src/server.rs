//! HTTP server implementation using Axum.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use cartwatch_core::config::GatewayConfig;
use cartwatch_scheduler::CartTracker;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    pub gateway_config: GatewayConfig,
    /// Cart lifecycle tracker: registry, timers, and lead delivery.
    pub tracker: CartTracker,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(gateway_config: GatewayConfig, tracker: CartTracker) -> Self {
        Self {
            gateway_config,
            tracker,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let cors = cors_layer(&shared.gateway_config);

    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/api/track-cart", post(super::routes::track_cart))
        .route("/api/checkout-started", post(super::routes::checkout_started))
        .route("/api/carts", get(super::routes::list_carts))
        .route("/api/deliveries", get(super::routes::list_deliveries))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// CORS for the storefront. Credentials are only allowed with an explicit
/// origin list; wildcard origins cannot carry them.
fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|s| match s.trim().parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("⚠️ Ignoring invalid CORS origin: {}", s);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins).allow_credentials(true)
    }
}

/// Start the HTTP server.
pub async fn start(config: &GatewayConfig, tracker: CartTracker) -> anyhow::Result<()> {
    let app = build_router(AppState::new(config.clone(), tracker));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

//! HTTP routes for Wayfetch
//!
//! This module defines all HTTP endpoints exposed by the router service.

pub mod admin;
pub mod fetch;
pub mod health;
pub mod metrics;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new().route("/v1/fetch", post(fetch::fetch));

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    let mut app = Router::new().merge(public_routes).merge(api_routes);

    // Admin surface is opt-in; it exposes config reload and telemetry dumps
    if state.config.admin_enabled {
        app = app
            .route("/admin/config/reload", post(admin::reload_config))
            .route("/admin/telemetry", get(admin::telemetry_dump));
    }

    app
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

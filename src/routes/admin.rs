//! Admin endpoints
//!
//! Operational surface for hot-reloading router configuration and
//! inspecting routing telemetry. Mounted only when WAYFETCH_ADMIN is set.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::{
    config::{RouterConfig, TierStats},
    error::{AppError, AppResult},
    AppState,
};

/// Response for a successful config reload
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub reloaded: bool,
    pub tiers: usize,
}

/// One telemetry counter row
#[derive(Debug, Serialize)]
pub struct TelemetryRow {
    pub domain: String,
    pub tier_id: String,
    pub attempts: u64,
    pub successes: u64,
}

/// `POST /admin/config/reload`
///
/// Re-reads the router configuration from the configured file and swaps it
/// in without restarting. Fails with 422 if the new catalog is invalid or
/// references a tier with no registered fetcher.
pub async fn reload_config(State(state): State<Arc<AppState>>) -> AppResult<Json<ReloadResponse>> {
    let path = state.config.router_config_path.as_deref().ok_or_else(|| {
        AppError::BadRequest("WAYFETCH_ROUTER_CONFIG is not set; nothing to reload".to_string())
    })?;

    let config = RouterConfig::from_file(path).map_err(AppError::Internal)?;
    let tiers = config.tiers.len();
    state.router.reload(config)?;

    info!(path = %path, tiers, "Router config reloaded via admin endpoint");
    Ok(Json(ReloadResponse {
        reloaded: true,
        tiers,
    }))
}

/// `GET /admin/telemetry`
///
/// Dumps the in-memory routing counters for diagnostics.
pub async fn telemetry_dump(State(state): State<Arc<AppState>>) -> Json<Vec<TelemetryRow>> {
    let mut rows: Vec<TelemetryRow> = state
        .router
        .telemetry()
        .snapshot()
        .into_iter()
        .map(|(domain, tier_id, TierStats { attempts, successes })| TelemetryRow {
            domain,
            tier_id,
            attempts,
            successes,
        })
        .collect();
    rows.sort_by(|a, b| (&a.domain, &a.tier_id).cmp(&(&b.domain, &b.tier_id)));
    Json(rows)
}

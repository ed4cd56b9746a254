//! Wayfetch - Adaptive multi-tier fetch router
//!
//! This library provides the core functionality for the Wayfetch routing
//! service: given a URL, it profiles the target site, selects a starting
//! fetch tier, cascades through fallback tiers on failure, and records
//! per-domain routing telemetry that biases future selections.

pub mod config;
pub mod error;
pub mod fetchers;
pub mod routes;
pub mod routing;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::{Config, RouterConfig};
pub use crate::fetchers::{Fetcher, FetcherRegistry};
pub use crate::routing::{FetchRouter, RoutingTelemetry};

use crate::fetchers::http::{HttpFetcher, HttpMode};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// The fetch router, sole entry point for routed fetches
    pub router: Arc<FetchRouter>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling; per-tier budgets
        // are enforced by the executor, not the client
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        let router_config = RouterConfig::load(config.router_config_path.as_deref())?;

        let registry = Arc::new(default_registry(http_client, &router_config));
        let telemetry = Arc::new(RoutingTelemetry::new());
        let router = Arc::new(FetchRouter::new(router_config, registry, telemetry)?);

        Ok(Self {
            config,
            start_time: Instant::now(),
            router,
        })
    }

    /// Create application state around a pre-built router, for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(config: Config, router: Arc<FetchRouter>) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            router,
        }
    }
}

/// Build the default fetcher registry for a tier catalog
///
/// Registers the reqwest-backed HTTP family: desktop emulation for
/// browser-class tiers (stand-ins until a real browser subsystem is plugged
/// in through the builder), mobile emulation for mobile tiers, and minimal
/// clients for the bottom of the ladder. Unknown tier ids fall back to the
/// desktop client so a custom catalog still routes.
pub fn default_registry(client: reqwest::Client, router_config: &RouterConfig) -> FetcherRegistry {
    let desktop = Arc::new(HttpFetcher::new(client.clone(), HttpMode::Desktop));
    let mobile = Arc::new(HttpFetcher::new(client.clone(), HttpMode::Mobile));
    let minimal = Arc::new(HttpFetcher::new(client, HttpMode::Minimal));

    let mut builder = FetcherRegistry::builder();
    for tier in &router_config.tiers {
        let fetcher: Arc<dyn Fetcher> = match tier.id.as_str() {
            "mobile_http" => mobile.clone(),
            "minimal_http" => minimal.clone(),
            _ => desktop.clone(),
        };
        builder = builder.register(tier.id.clone(), fetcher);
    }
    builder.build()
}

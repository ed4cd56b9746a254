//! Fetch router orchestrator
//!
//! The sole entry point collaborating subsystems invoke. Composes the
//! profiler, selector, cascader and telemetry store into a single
//! `fetch(request, deadline)` call that always resolves to a well-formed
//! FetchResult; no error escapes this surface.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use crate::{
    config::RouterConfig,
    error::AppResult,
    fetchers::FetcherRegistry,
    routes::metrics,
    routing::{
        cascade::{CascadeTermination, FallbackCascader},
        catalog::TierCatalog,
        executor::TierExecutor,
        profiler::SiteProfiler,
        selector::select_tier_index,
        telemetry::RoutingTelemetry,
        types::{FetchRequest, FetchResult},
    },
};

/// Immutable routing state swapped atomically on config reload
///
/// Each fetch clones the Arc once at entry, so a reload never tears the
/// catalog out from under a cascade in flight.
struct RouterSnapshot {
    catalog: TierCatalog,
    profiler: SiteProfiler,
    backoff: Duration,
}

/// Adaptive multi-tier fetch router
///
/// Telemetry and the fetcher registry are injected at construction so tests
/// can substitute isolated instances.
pub struct FetchRouter {
    snapshot: RwLock<Arc<RouterSnapshot>>,
    executor: TierExecutor,
    registry: Arc<FetcherRegistry>,
    telemetry: Arc<RoutingTelemetry>,
}

impl FetchRouter {
    /// Build a router from routing configuration
    ///
    /// Fails if the tier catalog is invalid or any catalog tier has no
    /// registered fetcher.
    pub fn new(
        config: RouterConfig,
        registry: Arc<FetcherRegistry>,
        telemetry: Arc<RoutingTelemetry>,
    ) -> AppResult<Self> {
        let snapshot = Self::build_snapshot(config, &registry, &telemetry)?;
        Ok(Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            executor: TierExecutor::new(registry.clone()),
            registry,
            telemetry,
        })
    }

    fn build_snapshot(
        config: RouterConfig,
        registry: &FetcherRegistry,
        telemetry: &Arc<RoutingTelemetry>,
    ) -> AppResult<RouterSnapshot> {
        let catalog = TierCatalog::new(config.tiers)?;
        registry.validate_catalog(&catalog)?;
        let profiler = SiteProfiler::new(config.indicators, telemetry.clone());
        Ok(RouterSnapshot {
            catalog,
            profiler,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Swap in new routing configuration without a restart
    ///
    /// In-flight fetches keep their snapshot; new fetches see the new
    /// catalog, backoff and indicator tables.
    pub fn reload(&self, config: RouterConfig) -> AppResult<()> {
        let snapshot = Self::build_snapshot(config, &self.registry, &self.telemetry)?;
        let tier_count = snapshot.catalog.len();
        *self.snapshot.write().unwrap() = Arc::new(snapshot);
        info!(tiers = tier_count, "Router configuration reloaded");
        Ok(())
    }

    /// Telemetry store backing this router
    pub fn telemetry(&self) -> &Arc<RoutingTelemetry> {
        &self.telemetry
    }

    /// Route one fetch through the tier ladder
    ///
    /// Pipeline: profile → select → cascade → record telemetry. Every path,
    /// including exhaustion and deadline expiry, resolves to a FetchResult;
    /// tier-level failures are visible only in the attempt trace.
    #[instrument(skip(self, request, deadline), fields(url = %request.url, intent = ?request.intent))]
    pub async fn fetch(&self, request: FetchRequest, deadline: tokio::time::Instant) -> FetchResult {
        let started = Instant::now();
        let snapshot = self.snapshot.read().unwrap().clone();

        let profile = snapshot.profiler.profile(&request.url, &snapshot.catalog);
        let initial_index = select_tier_index(
            &snapshot.catalog,
            &profile,
            request.intent,
            &request.preferences,
        );

        let cascader = FallbackCascader::new(snapshot.backoff);
        let outcome = cascader
            .run(
                &snapshot.catalog,
                &self.executor,
                &request,
                initial_index,
                deadline,
            )
            .await;

        self.telemetry.record(&profile.domain, &outcome.attempts);

        let total_duration_ms = started.elapsed().as_millis() as u64;
        let result_label = match outcome.termination {
            CascadeTermination::Succeeded => "success",
            CascadeTermination::AllTiersExhausted => "exhausted",
            CascadeTermination::DeadlineExceeded => "deadline_exceeded",
        };
        for attempt in &outcome.attempts {
            metrics::record_tier_attempt(&attempt.tier_id, attempt.success);
        }
        metrics::record_fetch(
            result_label,
            outcome.tier_used.as_deref().unwrap_or("none"),
            total_duration_ms as f64 / 1000.0,
        );

        info!(
            domain = %profile.domain,
            result = result_label,
            tier_used = outcome.tier_used.as_deref().unwrap_or("none"),
            attempts = outcome.attempts.len(),
            total_duration_ms,
            "Fetch routed"
        );

        FetchResult {
            success: outcome.succeeded(),
            content: outcome.content,
            tier_used: outcome.tier_used,
            attempts: outcome.attempts,
            total_duration_ms,
            site_analysis: profile.analysis(),
        }
    }
}

//! Fallback cascader
//!
//! State machine that walks tiers in priority order, starting from the
//! selected tier, until one succeeds, all remaining tiers are exhausted, or
//! the caller's deadline passes. Attempts within a cascade are strictly
//! sequential, separated by a fixed bounded backoff so a blocking target is
//! not hammered.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::routing::{
    catalog::TierCatalog,
    executor::TierExecutor,
    types::{AttemptRecord, FetchRequest},
};

/// Cascade state; Succeeded and Exhausted are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Idle,
    /// Attempting the tier at this priority index
    Attempting(usize),
    Succeeded,
    Exhausted,
}

/// Why the cascade stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTermination {
    Succeeded,
    /// Every tier from the initial index onward failed
    AllTiersExhausted,
    /// Deadline passed before the next attempt could launch
    DeadlineExceeded,
}

/// Result of a completed cascade
#[derive(Debug)]
pub struct CascadeOutcome {
    pub termination: CascadeTermination,
    pub attempts: Vec<AttemptRecord>,
    pub tier_used: Option<String>,
    pub content: Option<String>,
}

impl CascadeOutcome {
    pub fn succeeded(&self) -> bool {
        self.termination == CascadeTermination::Succeeded
    }
}

/// Walks the tier ladder on failure
pub struct FallbackCascader {
    /// Fixed pause between attempts; bounded, never exponential
    backoff: Duration,
}

impl FallbackCascader {
    pub fn new(backoff: Duration) -> Self {
        Self { backoff }
    }

    /// Run a cascade from the initial tier index
    ///
    /// The first attempt always runs, so every outcome carries at least one
    /// attempt record. The deadline is checked before each subsequent
    /// attempt (on both sides of the backoff pause), never mid-attempt;
    /// mid-attempt cancellation is the fetcher's own responsibility.
    pub async fn run(
        &self,
        catalog: &TierCatalog,
        executor: &TierExecutor,
        request: &FetchRequest,
        initial_index: usize,
        deadline: Instant,
    ) -> CascadeOutcome {
        let mut state = CascadeState::Idle;
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        let initial_index = initial_index.min(catalog.len() - 1);
        debug!(state = ?state, initial_index, url = %request.url, "Starting cascade");
        state = CascadeState::Attempting(initial_index);

        loop {
            let CascadeState::Attempting(index) = state else {
                unreachable!("cascade loop only runs in Attempting state");
            };

            // Never revisits a tier and never moves to a lower priority
            // index: the index only advances. The deadline is checked on
            // both sides of the backoff so an already-expired cascade never
            // sleeps a full backoff period before halting.
            if index > initial_index {
                let mut expired = Instant::now() >= deadline;
                if !expired {
                    tokio::time::sleep(self.backoff).await;
                    expired = Instant::now() >= deadline;
                }
                if expired {
                    warn!(
                        attempts = attempts.len(),
                        next_tier = %catalog.by_index(index).map(|t| t.id.as_str()).unwrap_or("?"),
                        "Deadline passed, halting cascade"
                    );
                    return CascadeOutcome {
                        termination: CascadeTermination::DeadlineExceeded,
                        attempts,
                        tier_used: None,
                        content: None,
                    };
                }
            }

            let tier = catalog
                .by_index(index)
                .expect("attempting index is always within catalog bounds");

            let outcome = executor.execute(tier, request).await;
            let succeeded = outcome.succeeded();
            attempts.push(outcome.record);

            if succeeded {
                state = CascadeState::Succeeded;
                debug!(state = ?state, tier = %tier.id, "Cascade succeeded");
                return CascadeOutcome {
                    termination: CascadeTermination::Succeeded,
                    attempts,
                    tier_used: Some(tier.id.clone()),
                    content: outcome.content,
                };
            }

            // Strictly the next tier in priority order; no wraparound.
            let next = index + 1;
            if next >= catalog.len() {
                state = CascadeState::Exhausted;
                info!(
                    state = ?state,
                    attempts = attempts.len(),
                    "All tiers exhausted"
                );
                return CascadeOutcome {
                    termination: CascadeTermination::AllTiersExhausted,
                    attempts,
                    tier_used: None,
                    content: None,
                };
            }
            state = CascadeState::Attempting(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::TierSpec;
    use crate::fetchers::mock::ScriptedFetcher;
    use crate::fetchers::{FetcherRegistry, FetcherRegistryBuilder};

    fn specs(ids: &[&str]) -> Vec<TierSpec> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| TierSpec {
                id: id.to_string(),
                name: id.to_string(),
                priority: (i + 1) as u8,
                supports_js: false,
                supports_interaction: false,
                stealth_strength: 0,
                nominal_success_rate: 0.5,
                timeout_ms: 1000,
            })
            .collect()
    }

    fn registry(entries: Vec<(&str, Arc<ScriptedFetcher>)>) -> FetcherRegistry {
        let mut builder: FetcherRegistryBuilder = FetcherRegistry::builder();
        for (id, fetcher) in entries {
            builder = builder.register(id, fetcher);
        }
        builder.build()
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_first_tier_success_stops_cascade() {
        let catalog = TierCatalog::new(specs(&["a", "b"])).unwrap();
        let a = Arc::new(ScriptedFetcher::always_ok("from a"));
        let b = Arc::new(ScriptedFetcher::always_ok("from b"));
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", a.clone()),
            ("b", b.clone()),
        ])));

        let cascader = FallbackCascader::new(Duration::from_millis(1));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                far_deadline(),
            )
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.tier_used.as_deref(), Some("a"));
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_cascades_to_next_tier() {
        let catalog = TierCatalog::new(specs(&["a", "b"])).unwrap();
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("b", Arc::new(ScriptedFetcher::always_ok("from b"))),
        ])));

        let cascader = FallbackCascader::new(Duration::from_millis(1));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                far_deadline(),
            )
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.tier_used.as_deref(), Some("b"));
        assert_eq!(outcome.attempts.len(), 2);
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[1].success);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_exhausts() {
        let catalog = TierCatalog::new(specs(&["a", "b", "c"])).unwrap();
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("b", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("c", Arc::new(ScriptedFetcher::always_err("nope"))),
        ])));

        let cascader = FallbackCascader::new(Duration::from_millis(1));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                far_deadline(),
            )
            .await;

        assert_eq!(outcome.termination, CascadeTermination::AllTiersExhausted);
        assert_eq!(outcome.attempts.len(), 3);
        assert!(outcome.content.is_none());
        assert!(outcome.tier_used.is_none());
    }

    #[tokio::test]
    async fn test_cascade_starts_at_initial_index() {
        let catalog = TierCatalog::new(specs(&["a", "b", "c"])).unwrap();
        let a = Arc::new(ScriptedFetcher::always_ok("from a"));
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", a.clone()),
            ("b", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("c", Arc::new(ScriptedFetcher::always_ok("from c"))),
        ])));

        let cascader = FallbackCascader::new(Duration::from_millis(1));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                1,
                far_deadline(),
            )
            .await;

        // Never goes back to a lower priority index
        assert_eq!(a.calls(), 0);
        assert_eq!(outcome.tier_used.as_deref(), Some("c"));
        assert_eq!(outcome.attempts[0].tier_id, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_halts_before_next_attempt() {
        let catalog = TierCatalog::new(specs(&["a", "b", "c", "d", "e"])).unwrap();
        let c = Arc::new(ScriptedFetcher::always_err("nope"));
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("b", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("c", c.clone()),
            ("d", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("e", Arc::new(ScriptedFetcher::always_err("nope"))),
        ])));

        // Deadline covers one backoff period: the first two attempts run,
        // the third finds the deadline passed.
        let cascader = FallbackCascader::new(Duration::from_millis(50));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                Instant::now() + Duration::from_millis(75),
            )
            .await;

        assert_eq!(outcome.termination, CascadeTermination::DeadlineExceeded);
        assert_eq!(outcome.attempts.len(), 2);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_halts_without_backoff_sleep() {
        let catalog = TierCatalog::new(specs(&["a", "b"])).unwrap();
        let b = Arc::new(ScriptedFetcher::always_ok("too late"));
        let executor = TierExecutor::new(Arc::new(registry(vec![
            ("a", Arc::new(ScriptedFetcher::always_err("nope"))),
            ("b", b.clone()),
        ])));

        let cascader = FallbackCascader::new(Duration::from_millis(300));
        let start = Instant::now();
        // Deadline is already at its limit once the first attempt finishes
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                start,
            )
            .await;

        assert_eq!(outcome.termination, CascadeTermination::DeadlineExceeded);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(b.calls(), 0);
        // The paused clock only advances when something sleeps; halting on
        // an expired deadline must not burn a backoff period.
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test]
    async fn test_expired_deadline_still_runs_first_attempt() {
        let catalog = TierCatalog::new(specs(&["a"])).unwrap();
        let executor = TierExecutor::new(Arc::new(registry(vec![(
            "a",
            Arc::new(ScriptedFetcher::always_ok("content")),
        )])));

        let cascader = FallbackCascader::new(Duration::from_millis(1));
        let outcome = cascader
            .run(
                &catalog,
                &executor,
                &FetchRequest::get("https://example.com"),
                0,
                Instant::now() - Duration::from_secs(1),
            )
            .await;

        // Every cascade carries at least one attempt
        assert_eq!(outcome.attempts.len(), 1);
        assert!(outcome.succeeded());
    }
}

//! Tier executor
//!
//! Runs exactly one tier against a URL. Resolves the tier's fetcher from
//! the registry, applies the tier's timeout budget, and normalizes every
//! outcome (content, delegate error, timeout) into a uniform attempt
//! record. No delegate error propagates past this module.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::{
    error::TierFailure,
    fetchers::{FetcherRegistry, TierOptions},
    routing::{
        catalog::TierDescriptor,
        types::{AttemptRecord, FetchRequest},
    },
};

/// Outcome of one tier execution
#[derive(Debug)]
pub struct TierOutcome {
    pub record: AttemptRecord,
    /// Present only when the attempt succeeded
    pub content: Option<String>,
}

impl TierOutcome {
    pub fn succeeded(&self) -> bool {
        self.record.success
    }
}

/// Executes single tier attempts via the fetcher registry
pub struct TierExecutor {
    registry: Arc<FetcherRegistry>,
}

impl TierExecutor {
    pub fn new(registry: Arc<FetcherRegistry>) -> Self {
        Self { registry }
    }

    /// Execute one tier for a request, never returning an error
    ///
    /// Timeouts and delegate failures are classified and folded into the
    /// attempt record. The in-flight delegate future is dropped at the
    /// timeout boundary; resource release on that path is the delegate's
    /// RAII obligation.
    pub async fn execute(&self, tier: &TierDescriptor, request: &FetchRequest) -> TierOutcome {
        let started = Instant::now();

        let Some(fetcher) = self.registry.resolve(&tier.id) else {
            // Registry is validated against the catalog at startup and on
            // reload, so this indicates a wiring bug rather than bad input.
            warn!(tier = %tier.id, "No fetcher registered for tier");
            return self.failed(
                tier,
                started,
                TierFailure::Execution {
                    tier_id: tier.id.clone(),
                    message: "no fetcher registered".to_string(),
                },
            );
        };

        let options = TierOptions {
            method: request.method.clone(),
            headers: request.headers.clone(),
            stealth_strength: tier.stealth_strength,
            supports_js: tier.supports_js,
        };

        debug!(
            tier = %tier.id,
            fetcher = fetcher.name(),
            url = %request.url,
            budget_ms = tier.timeout.as_millis() as u64,
            "Executing tier"
        );

        match tokio::time::timeout(tier.timeout, fetcher.fetch(&request.url, &options)).await {
            Ok(Ok(fetched)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                debug!(
                    tier = %tier.id,
                    status = fetched.status,
                    duration_ms,
                    "Tier succeeded"
                );
                TierOutcome {
                    record: AttemptRecord {
                        tier_id: tier.id.clone(),
                        success: true,
                        duration_ms,
                        error: None,
                    },
                    content: Some(fetched.content),
                }
            }
            Ok(Err(err)) => self.failed(
                tier,
                started,
                TierFailure::Execution {
                    tier_id: tier.id.clone(),
                    message: err.to_string(),
                },
            ),
            Err(_) => self.failed(
                tier,
                started,
                TierFailure::Timeout {
                    tier_id: tier.id.clone(),
                    budget_ms: tier.timeout.as_millis() as u64,
                },
            ),
        }
    }

    fn failed(&self, tier: &TierDescriptor, started: Instant, failure: TierFailure) -> TierOutcome {
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            tier = %tier.id,
            kind = failure.kind(),
            duration_ms,
            error = %failure,
            "Tier failed"
        );
        TierOutcome {
            record: AttemptRecord {
                tier_id: tier.id.clone(),
                success: false,
                duration_ms,
                error: Some(failure.to_string()),
            },
            content: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::TierSpec;
    use crate::fetchers::mock::ScriptedFetcher;
    use crate::routing::catalog::TierCatalog;

    fn tier(id: &str, timeout_ms: u64) -> TierDescriptor {
        let catalog = TierCatalog::new(vec![TierSpec {
            id: id.to_string(),
            name: id.to_string(),
            priority: 1,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 0,
            nominal_success_rate: 0.5,
            timeout_ms,
        }])
        .unwrap();
        catalog.by_index(0).unwrap().clone()
    }

    fn executor_with(fetcher: ScriptedFetcher, tier_id: &str) -> TierExecutor {
        let registry = FetcherRegistry::builder()
            .register(tier_id, Arc::new(fetcher))
            .build();
        TierExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_success_carries_content() {
        let executor = executor_with(ScriptedFetcher::always_ok("body"), "t");
        let outcome = executor
            .execute(&tier("t", 1000), &FetchRequest::get("https://example.com"))
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.content.as_deref(), Some("body"));
        assert!(outcome.record.error.is_none());
    }

    #[tokio::test]
    async fn test_delegate_error_normalized() {
        let executor = executor_with(ScriptedFetcher::always_err("connection reset"), "t");
        let outcome = executor
            .execute(&tier("t", 1000), &FetchRequest::get("https://example.com"))
            .await;

        assert!(!outcome.succeeded());
        assert!(outcome.content.is_none());
        assert!(outcome.record.error.as_deref().unwrap().contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_classified_as_budget_exceeded() {
        let executor = executor_with(
            ScriptedFetcher::always_stalls(Duration::from_secs(30)),
            "t",
        );
        let outcome = executor
            .execute(&tier("t", 20), &FetchRequest::get("https://example.com"))
            .await;

        assert!(!outcome.succeeded());
        assert!(outcome.record.error.as_deref().unwrap().contains("budget"));
    }

    #[tokio::test]
    async fn test_missing_fetcher_is_execution_failure() {
        let registry = FetcherRegistry::builder().build();
        let executor = TierExecutor::new(Arc::new(registry));
        let outcome = executor
            .execute(&tier("t", 1000), &FetchRequest::get("https://example.com"))
            .await;

        assert!(!outcome.succeeded());
        assert!(outcome
            .record
            .error
            .as_deref()
            .unwrap()
            .contains("no fetcher registered"));
    }
}

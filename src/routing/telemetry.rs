//! Routing telemetry store
//!
//! In-memory attempt/success counters per (domain, tier). These bias future
//! tier recommendations and feed the attempt history attached to site
//! profiles. State lives for the process lifetime; each Wayfetch instance
//! tracks outcomes from its own observations only.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::config::{HistoricalRates, TierStats};
use crate::routing::types::AttemptRecord;

/// Concurrent-safe per-(domain, tier) outcome counters
///
/// All counters for one fetch are applied under a single write lock, so a
/// reader can never observe successes > attempts for any pair.
pub struct RoutingTelemetry {
    stats: RwLock<HashMap<(String, String), TierStats>>,
}

impl RoutingTelemetry {
    pub fn new() -> Self {
        Self {
            stats: RwLock::new(HashMap::new()),
        }
    }

    /// Record the outcome of one completed fetch
    ///
    /// Increments attempts for every tier in the trace and successes for the
    /// tier that ultimately succeeded, if any.
    pub fn record(&self, domain: &str, attempts: &[AttemptRecord]) {
        let mut stats = self.stats.write().unwrap();
        for attempt in attempts {
            let entry = stats
                .entry((domain.to_string(), attempt.tier_id.clone()))
                .or_default();
            entry.attempts += 1;
            if attempt.success {
                entry.successes += 1;
            }
        }

        debug!(
            domain = %domain,
            attempts = attempts.len(),
            succeeded = attempts.iter().any(|a| a.success),
            "Recorded routing telemetry"
        );
    }

    /// Snapshot of all counters for a domain, keyed by tier id
    pub fn rates_for_domain(&self, domain: &str) -> HistoricalRates {
        let stats = self.stats.read().unwrap();
        stats
            .iter()
            .filter(|((d, _), _)| d == domain)
            .map(|((_, tier_id), stat)| (tier_id.clone(), *stat))
            .collect()
    }

    /// Counters for one (domain, tier) pair
    pub fn stats_for(&self, domain: &str, tier_id: &str) -> TierStats {
        let stats = self.stats.read().unwrap();
        stats
            .get(&(domain.to_string(), tier_id.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Full dump of all counters, for the admin surface
    pub fn snapshot(&self) -> Vec<(String, String, TierStats)> {
        let stats = self.stats.read().unwrap();
        stats
            .iter()
            .map(|((domain, tier), stat)| (domain.clone(), tier.clone(), *stat))
            .collect()
    }
}

impl Default for RoutingTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn attempt(tier_id: &str, success: bool) -> AttemptRecord {
        AttemptRecord {
            tier_id: tier_id.to_string(),
            success,
            duration_ms: 10,
            error: if success { None } else { Some("failed".to_string()) },
        }
    }

    #[test]
    fn test_record_increments_attempts_and_successes() {
        let telemetry = RoutingTelemetry::new();
        telemetry.record(
            "example.com",
            &[attempt("browser", false), attempt("plain_http", true)],
        );

        let browser = telemetry.stats_for("example.com", "browser");
        assert_eq!(browser.attempts, 1);
        assert_eq!(browser.successes, 0);

        let plain = telemetry.stats_for("example.com", "plain_http");
        assert_eq!(plain.attempts, 1);
        assert_eq!(plain.successes, 1);
    }

    #[test]
    fn test_domains_tracked_separately() {
        let telemetry = RoutingTelemetry::new();
        telemetry.record("a.com", &[attempt("plain_http", true)]);
        telemetry.record("b.com", &[attempt("plain_http", false)]);

        assert_eq!(telemetry.stats_for("a.com", "plain_http").successes, 1);
        assert_eq!(telemetry.stats_for("b.com", "plain_http").successes, 0);
    }

    #[test]
    fn test_rates_for_domain_snapshot() {
        let telemetry = RoutingTelemetry::new();
        telemetry.record(
            "example.com",
            &[attempt("browser", false), attempt("plain_http", true)],
        );

        let rates = telemetry.rates_for_domain("example.com");
        assert_eq!(rates.len(), 2);
        assert_eq!(rates["plain_http"].successes, 1);
    }

    #[test]
    fn test_successes_never_exceed_attempts_under_contention() {
        let telemetry = Arc::new(RoutingTelemetry::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let telemetry = telemetry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    telemetry.record("hot.com", &[attempt("plain_http", i % 2 == 0)]);
                    let stats = telemetry.stats_for("hot.com", "plain_http");
                    assert!(stats.successes <= stats.attempts);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = telemetry.stats_for("hot.com", "plain_http");
        assert_eq!(stats.attempts, 1600);
        assert_eq!(stats.successes, 800);
    }
}

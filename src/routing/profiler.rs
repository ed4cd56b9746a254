//! Site profiler
//!
//! Inspects a URL and produces a feature profile: complexity, security and
//! performance indicator scores, a recommended starting tier, and the
//! domain's historical routing outcomes. Profiling never fails; any
//! inspection error degrades to a fixed default profile so the router never
//! stalls on a malformed URL.

use std::sync::Arc;

use tracing::warn;
use url::Url;

use crate::{
    config::{HistoricalRates, IndicatorTables},
    routing::{catalog::TierCatalog, telemetry::RoutingTelemetry, types::SiteAnalysis},
};

/// Computed feature summary of a URL, created per fetch call
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub domain: String,
    pub complexity_score: u8,
    pub security_score: u8,
    pub performance_score: u8,
    pub recommended_tier_id: String,
    pub historical_success_rates: HistoricalRates,
    /// True when the default profile was substituted after an inspection failure
    pub degraded: bool,
}

impl SiteProfile {
    /// Serializable snapshot attached to every FetchResult
    pub fn analysis(&self) -> SiteAnalysis {
        SiteAnalysis {
            domain: self.domain.clone(),
            complexity_score: self.complexity_score,
            security_score: self.security_score,
            performance_score: self.performance_score,
            recommended_tier_id: self.recommended_tier_id.clone(),
            historical_success_rates: self.historical_success_rates.clone(),
            degraded: self.degraded,
        }
    }
}

/// Site profiler over configurable indicator tables
///
/// Stateless aside from read-only telemetry snapshots; two calls on the same
/// URL with unchanged telemetry yield identical scores.
pub struct SiteProfiler {
    indicators: IndicatorTables,
    telemetry: Arc<RoutingTelemetry>,
}

impl SiteProfiler {
    pub fn new(indicators: IndicatorTables, telemetry: Arc<RoutingTelemetry>) -> Self {
        Self {
            indicators,
            telemetry,
        }
    }

    /// Profile a URL against the indicator tables and the given catalog
    ///
    /// Never raises: on any inspection failure it logs the degradation and
    /// returns the fixed default profile (mid complexity, mid security,
    /// mid-stealth recommendation).
    pub fn profile(&self, url: &str, catalog: &TierCatalog) -> SiteProfile {
        match self.try_profile(url, catalog) {
            Ok(profile) => profile,
            Err(reason) => {
                warn!(url = %url, reason = %reason, "Profiling degraded, using default profile");
                self.default_profile(url, catalog)
            }
        }
    }

    fn try_profile(&self, url: &str, catalog: &TierCatalog) -> Result<SiteProfile, String> {
        let parsed = Url::parse(url).map_err(|e| format!("unparseable URL: {}", e))?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| "URL has no host".to_string())?
            .to_ascii_lowercase();

        let ind = &self.indicators;

        // Complexity: one point per matching indicator group
        let is_spa = domain_matches_any(&domain, &ind.spa_domains);
        let is_heavy_js = domain_matches_any(&domain, &ind.heavy_js_domains);
        let is_social = domain_matches_any(&domain, &ind.social_domains);
        let is_streaming = domain_matches_any(&domain, &ind.streaming_domains);
        let is_ecommerce = domain_matches_any(&domain, &ind.ecommerce_domains);
        let complexity_score =
            count_flags(&[is_spa, is_heavy_js, is_social, is_streaming, is_ecommerce]);

        // Security
        let is_anti_bot = domain_matches_any(&domain, &ind.anti_bot_domains);
        let is_captcha_prone = domain_matches_any(&domain, &ind.captcha_prone_domains);
        let is_ip_restricted = domain_matches_any(&domain, &ind.ip_restricted_domains);
        let is_auth_walled = domain_matches_any(&domain, &ind.auth_wall_domains);
        let security_score = count_flags(&[
            is_anti_bot,
            is_captcha_prone,
            is_ip_restricted,
            is_auth_walled,
        ]);

        // Performance
        let is_cdn_fronted = domain_matches_any(&domain, &ind.cdn_fronted_domains);
        let is_large_payload = domain_matches_any(&domain, &ind.large_payload_domains);
        let performance_score = count_flags(&[is_cdn_fronted, is_large_payload]);

        // Indicator-to-tier mapping table. Heavy flags are the groups that
        // imply a real browser is required to render anything useful.
        let heavy = is_heavy_js || is_streaming || is_social;
        let recommended_tier_id = if security_score >= 2 || heavy {
            catalog.highest_stealth().id.clone()
        } else if is_spa && complexity_score == 1 {
            catalog.mid_stealth().id.clone()
        } else {
            catalog.lowest_cost().id.clone()
        };

        Ok(SiteProfile {
            historical_success_rates: self.telemetry.rates_for_domain(&domain),
            domain,
            complexity_score,
            security_score,
            performance_score,
            recommended_tier_id,
            degraded: false,
        })
    }

    /// Fixed fallback profile used when inspection fails
    fn default_profile(&self, url: &str, catalog: &TierCatalog) -> SiteProfile {
        // Best-effort domain label so telemetry still aggregates somewhere
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_else(|| "unknown".to_string());

        SiteProfile {
            historical_success_rates: self.telemetry.rates_for_domain(&domain),
            domain,
            complexity_score: 2,
            security_score: 2,
            performance_score: 1,
            recommended_tier_id: catalog.mid_stealth().id.clone(),
            degraded: true,
        }
    }
}

/// Suffix match with a label boundary, so "x.com" matches "www.x.com" but
/// not "matrix.com". Entries ending in '.' are subdomain prefixes instead
/// ("app." matches "app.example.com").
fn domain_matches(domain: &str, entry: &str) -> bool {
    if let Some(prefix) = entry.strip_suffix('.') {
        return domain
            .split('.')
            .next()
            .map(|label| label == prefix)
            .unwrap_or(false);
    }
    domain == entry || domain.ends_with(&format!(".{}", entry))
}

fn domain_matches_any(domain: &str, entries: &[String]) -> bool {
    entries.iter().any(|e| domain_matches(domain, e))
}

fn count_flags(flags: &[bool]) -> u8 {
    flags.iter().filter(|f| **f).count() as u8
}

//! Configuration management for Wayfetch
//!
//! Process configuration is loaded from environment variables; the routing
//! configuration (tier catalog, timeout budgets, backoff, profiler indicator
//! tables) is data, loadable from a JSON file and hot-reloadable at runtime.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Path to the router configuration file (JSON); optional, defaults apply
    pub router_config_path: Option<String>,

    /// Enable admin endpoints (config reload, telemetry dump)
    pub admin_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("WAYFETCH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("WAYFETCH_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid WAYFETCH_PORT")?,

            router_config_path: env::var("WAYFETCH_ROUTER_CONFIG").ok(),

            admin_enabled: env::var("WAYFETCH_ADMIN")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}

/// One tier definition in the routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    pub id: String,
    pub name: String,
    /// Dense 1..N; 1 is the most capable (highest stealth) tier
    pub priority: u8,
    #[serde(default)]
    pub supports_js: bool,
    #[serde(default)]
    pub supports_interaction: bool,
    /// 0-5, higher means stronger anti-detection posture
    #[serde(default)]
    pub stealth_strength: u8,
    /// Hand-tuned nominal success rate; informational, not a selection input
    #[serde(default = "default_success_rate")]
    pub nominal_success_rate: f64,
    /// Per-tier execution budget
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_success_rate() -> f64 {
    0.8
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Domain indicator tables driving the site profiler
///
/// Each list is matched by suffix against the request domain; a score is the
/// count of matching indicator groups, not of individual entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorTables {
    /// Complexity indicators
    #[serde(default)]
    pub spa_domains: Vec<String>,
    #[serde(default)]
    pub heavy_js_domains: Vec<String>,
    #[serde(default)]
    pub social_domains: Vec<String>,
    #[serde(default)]
    pub streaming_domains: Vec<String>,
    #[serde(default)]
    pub ecommerce_domains: Vec<String>,

    /// Security indicators
    #[serde(default)]
    pub anti_bot_domains: Vec<String>,
    #[serde(default)]
    pub captcha_prone_domains: Vec<String>,
    #[serde(default)]
    pub ip_restricted_domains: Vec<String>,
    #[serde(default)]
    pub auth_wall_domains: Vec<String>,

    /// Performance indicators
    #[serde(default)]
    pub cdn_fronted_domains: Vec<String>,
    #[serde(default)]
    pub large_payload_domains: Vec<String>,
}

/// Routing configuration: tier catalog, backoff, and profiler tables
///
/// Everything here is hot-reloadable through the admin endpoint; the process
/// never needs a restart for a catalog or indicator change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub tiers: Vec<TierSpec>,
    /// Fixed pause between cascade attempts; bounded, never exponential
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub indicators: IndicatorTables,
}

fn default_backoff_ms() -> u64 {
    250
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            backoff_ms: default_backoff_ms(),
            indicators: default_indicators(),
        }
    }
}

impl RouterConfig {
    /// Load routing configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config {}", path.display()))?;
        let config: RouterConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse router config {}", path.display()))?;
        Ok(config)
    }

    /// Load from the configured path, falling back to built-in defaults
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}

/// Built-in tier ladder, most capable first
///
/// Browser tiers carry larger budgets than plain HTTP tiers. Success rates
/// are hand-tuned starting points, expected to be overridden by operators
/// once real telemetry exists.
fn default_tiers() -> Vec<TierSpec> {
    vec![
        TierSpec {
            id: "browser".to_string(),
            name: "Scriptable browser engine".to_string(),
            priority: 1,
            supports_js: true,
            supports_interaction: true,
            stealth_strength: 3,
            nominal_success_rate: 0.95,
            timeout_ms: 45_000,
        },
        TierSpec {
            id: "stealth_browser".to_string(),
            name: "Stealth-profile browser".to_string(),
            priority: 2,
            supports_js: true,
            supports_interaction: true,
            stealth_strength: 5,
            nominal_success_rate: 0.9,
            timeout_ms: 60_000,
        },
        TierSpec {
            id: "mobile_http".to_string(),
            name: "Mobile-emulation client".to_string(),
            priority: 3,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 3,
            nominal_success_rate: 0.75,
            timeout_ms: 15_000,
        },
        TierSpec {
            id: "proxy_http".to_string(),
            name: "Rotating-proxy client".to_string(),
            priority: 4,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 2,
            nominal_success_rate: 0.7,
            timeout_ms: 15_000,
        },
        TierSpec {
            id: "plain_http".to_string(),
            name: "Plain HTTP client".to_string(),
            priority: 5,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 1,
            nominal_success_rate: 0.6,
            timeout_ms: 10_000,
        },
        TierSpec {
            id: "minimal_http".to_string(),
            name: "Minimal HTTP client".to_string(),
            priority: 6,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 0,
            nominal_success_rate: 0.5,
            timeout_ms: 5_000,
        },
    ]
}

fn default_indicators() -> IndicatorTables {
    let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
    IndicatorTables {
        spa_domains: list(&["app.", "dashboard.", "console."]),
        heavy_js_domains: list(&["maps.google.com", "figma.com", "notion.so"]),
        social_domains: list(&[
            "facebook.com",
            "instagram.com",
            "twitter.com",
            "x.com",
            "linkedin.com",
            "tiktok.com",
        ]),
        streaming_domains: list(&["youtube.com", "netflix.com", "twitch.tv", "vimeo.com"]),
        ecommerce_domains: list(&["amazon.com", "ebay.com", "etsy.com", "walmart.com"]),
        anti_bot_domains: list(&[
            "cloudflare.com",
            "ticketmaster.com",
            "nike.com",
            "linkedin.com",
            "instagram.com",
        ]),
        captcha_prone_domains: list(&["google.com", "ticketmaster.com"]),
        ip_restricted_domains: list(&["craigslist.org"]),
        auth_wall_domains: list(&["linkedin.com", "instagram.com", "pinterest.com"]),
        cdn_fronted_domains: list(&["wikipedia.org", "github.com", "stackoverflow.com"]),
        large_payload_domains: list(&["youtube.com", "netflix.com", "archive.org"]),
    }
}

/// Historical success counters exposed to the profiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    pub attempts: u64,
    pub successes: u64,
}

/// Type alias for per-domain historical rates keyed by tier id
pub type HistoricalRates = HashMap<String, TierStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_default_router_config_is_dense() {
        let config = RouterConfig::default();
        assert_eq!(config.tiers.len(), 6);
        for (i, tier) in config.tiers.iter().enumerate() {
            assert_eq!(tier.priority as usize, i + 1);
        }
    }

    #[test]
    fn test_router_config_parses_minimal_json() {
        let raw = r#"{
            "tiers": [
                {"id": "only", "name": "Only tier", "priority": 1}
            ]
        }"#;
        let config: RouterConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.tiers.len(), 1);
        assert_eq!(config.backoff_ms, 250);
        assert_eq!(config.tiers[0].timeout_ms, 10_000);
        assert!(config.indicators.social_domains.is_empty());
    }
}

//! Core routing types
//!
//! Wire-level request/response types for the fetch router. These serialize
//! directly to the shapes exposed by the HTTP API layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::HistoricalRates;

/// Declared purpose of a fetch, used to bias tier selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchIntent {
    Navigation,
    Interaction,
    DataExtraction,
    FormSubmission,
    MediaAccess,
    ApiRequest,
}

impl Default for FetchIntent {
    fn default() -> Self {
        FetchIntent::Navigation
    }
}

impl FetchIntent {
    /// Signed shift applied to the recommended tier index
    ///
    /// Negative values move toward stealthier tiers, positive values toward
    /// cheaper ones. An API request wants a bare client; interactive and
    /// form flows want more capable browsers.
    pub fn index_delta(self) -> i32 {
        match self {
            FetchIntent::Navigation => 0,
            FetchIntent::Interaction => -1,
            FetchIntent::DataExtraction => 1,
            FetchIntent::FormSubmission => -1,
            FetchIntent::MediaAccess => -2,
            FetchIntent::ApiRequest => 2,
        }
    }
}

/// Caller preferences for tier selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_speed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_reliability: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_stealth: Option<bool>,
}

impl FetchPreferences {
    /// Combined signed shift from all set preferences
    pub fn index_delta(&self) -> i32 {
        let mut delta = 0;
        if self.prefer_speed == Some(true) {
            delta += 1;
        }
        if self.prefer_reliability == Some(true) {
            delta -= 1;
        }
        if self.prefer_stealth == Some(true) {
            delta -= 1;
        }
        delta
    }
}

/// Inbound fetch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub intent: FetchIntent,
    #[serde(default)]
    pub preferences: FetchPreferences,
}

fn default_method() -> String {
    "GET".to_string()
}

impl FetchRequest {
    /// Minimal GET request for a URL with default intent and no preferences
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: HashMap::new(),
            intent: FetchIntent::default(),
            preferences: FetchPreferences::default(),
        }
    }
}

/// One tier attempt within a cascade, in execution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub tier_id: String,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot of the site analysis that drove tier selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteAnalysis {
    pub domain: String,
    pub complexity_score: u8,
    pub security_score: u8,
    pub performance_score: u8,
    pub recommended_tier_id: String,
    /// Per-tier attempt/success counters for this domain at selection time
    #[serde(default)]
    pub historical_success_rates: HistoricalRates,
    /// True when profiling degraded to the fixed default profile
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

/// Final outcome of a routed fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_used: Option<String>,
    pub attempts: Vec<AttemptRecord>,
    pub total_duration_ms: u64,
    pub site_analysis: SiteAnalysis,
}

/// Content returned by a Fetcher delegate
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub content: String,
    pub status: u16,
}

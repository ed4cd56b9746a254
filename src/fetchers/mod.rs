//! Fetcher capability layer
//!
//! Defines the trait interface every tier's fetch strategy implements, and
//! the startup-built registry that maps tier ids to implementations. The
//! router treats fetchers as opaque: all anti-detection specifics (user
//! agents, viewports, proxies) live inside the implementations.

pub mod http;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult, FetchError},
    routing::{catalog::TierCatalog, types::FetchedContent},
};

/// Per-attempt options passed from the tier descriptor to the delegate
#[derive(Debug, Clone, Default)]
pub struct TierOptions {
    pub method: String,
    pub headers: HashMap<String, String>,
    /// 0-5, from the tier descriptor; implementations decide what it means
    pub stealth_strength: u8,
    pub supports_js: bool,
}

/// Trait defining the interface for tier fetch strategies
///
/// Implementations handle the actual network/browser work for one tier
/// (browser engine, stealth browser, plain HTTP, ...) while keeping a
/// uniform surface for the executor.
///
/// Implementations MUST scope any resource they open (browser context,
/// connection) so it is released on every exit path, including when the
/// executor's timeout drops the in-flight future.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Strategy name for logging and metrics
    fn name(&self) -> &'static str;

    /// Fetch a URL, returning content or a classified failure
    async fn fetch(&self, url: &str, options: &TierOptions) -> Result<FetchedContent, FetchError>;
}

/// Registry mapping tier id to a fetcher implementation
///
/// Built once at startup; resolution is a plain map lookup, never a
/// string-keyed dispatch chain.
pub struct FetcherRegistry {
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
}

impl FetcherRegistry {
    pub fn builder() -> FetcherRegistryBuilder {
        FetcherRegistryBuilder {
            fetchers: HashMap::new(),
        }
    }

    /// Resolve the fetcher registered for a tier
    pub fn resolve(&self, tier_id: &str) -> Option<Arc<dyn Fetcher>> {
        self.fetchers.get(tier_id).cloned()
    }

    /// Verify every tier in the catalog has a registered fetcher
    ///
    /// Run at startup and again on every config reload, so a catalog change
    /// can never route to a missing capability.
    pub fn validate_catalog(&self, catalog: &TierCatalog) -> AppResult<()> {
        for tier in catalog.tiers() {
            if !self.fetchers.contains_key(&tier.id) {
                return Err(AppError::InvalidConfig(format!(
                    "no fetcher registered for tier '{}'",
                    tier.id
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`FetcherRegistry`]
pub struct FetcherRegistryBuilder {
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
}

impl FetcherRegistryBuilder {
    /// Register a fetcher for a tier id, replacing any previous registration
    pub fn register(mut self, tier_id: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetchers.insert(tier_id.into(), fetcher);
        self
    }

    pub fn build(self) -> FetcherRegistry {
        FetcherRegistry {
            fetchers: self.fetchers,
        }
    }
}

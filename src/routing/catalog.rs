//! Tier catalog
//!
//! Read-only, ordered registry of fetch tier descriptors. Validated once at
//! construction; has no runtime failure mode afterwards.

use std::collections::HashSet;
use std::time::Duration;

use crate::{
    config::TierSpec,
    error::{AppError, AppResult},
};

/// Immutable descriptor of one fetch tier
#[derive(Debug, Clone)]
pub struct TierDescriptor {
    pub id: String,
    pub name: String,
    /// Dense 1..N; 1 is the most capable tier
    pub priority: u8,
    pub supports_js: bool,
    pub supports_interaction: bool,
    /// 0-5
    pub stealth_strength: u8,
    pub nominal_success_rate: f64,
    /// Execution budget for one attempt on this tier
    pub timeout: Duration,
}

impl From<TierSpec> for TierDescriptor {
    fn from(spec: TierSpec) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            priority: spec.priority,
            supports_js: spec.supports_js,
            supports_interaction: spec.supports_interaction,
            stealth_strength: spec.stealth_strength,
            nominal_success_rate: spec.nominal_success_rate,
            timeout: Duration::from_millis(spec.timeout_ms),
        }
    }
}

/// Ordered, validated registry of tiers
///
/// Tiers are held sorted by priority, so the vector index is the priority
/// index used by the selector and cascader (index 0 = priority 1).
#[derive(Debug, Clone)]
pub struct TierCatalog {
    tiers: Vec<TierDescriptor>,
}

impl TierCatalog {
    /// Build a catalog from tier specs, validating structural invariants
    ///
    /// Fails if the list is empty, ids repeat, or priorities do not form a
    /// dense 1..N sequence.
    pub fn new(specs: Vec<TierSpec>) -> AppResult<Self> {
        if specs.is_empty() {
            return Err(AppError::InvalidConfig(
                "tier catalog must contain at least one tier".to_string(),
            ));
        }

        let mut seen_ids = HashSet::new();
        for spec in &specs {
            if !seen_ids.insert(spec.id.clone()) {
                return Err(AppError::InvalidConfig(format!(
                    "duplicate tier id '{}'",
                    spec.id
                )));
            }
        }

        let mut tiers: Vec<TierDescriptor> = specs.into_iter().map(TierDescriptor::from).collect();
        tiers.sort_by_key(|t| t.priority);

        for (i, tier) in tiers.iter().enumerate() {
            let expected = (i + 1) as u8;
            if tier.priority != expected {
                return Err(AppError::InvalidConfig(format!(
                    "tier priorities must form a dense 1..{} sequence; tier '{}' has priority {}",
                    tiers.len(),
                    tier.id,
                    tier.priority
                )));
            }
        }

        Ok(Self { tiers })
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Tiers in priority order
    pub fn tiers(&self) -> &[TierDescriptor] {
        &self.tiers
    }

    /// Tier at a priority index (0 = most capable)
    pub fn by_index(&self, index: usize) -> Option<&TierDescriptor> {
        self.tiers.get(index)
    }

    /// Priority index of a tier id
    pub fn index_of(&self, tier_id: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.id == tier_id)
    }

    /// Highest-stealth tier (priority index 0)
    pub fn highest_stealth(&self) -> &TierDescriptor {
        &self.tiers[0]
    }

    /// Mid-ladder tier, used for SPA-only recommendations and the default
    /// degraded profile
    pub fn mid_stealth(&self) -> &TierDescriptor {
        &self.tiers[self.tiers.len() / 2]
    }

    /// Cheapest tier (last priority index)
    pub fn lowest_cost(&self) -> &TierDescriptor {
        &self.tiers[self.tiers.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;

    fn spec(id: &str, priority: u8) -> TierSpec {
        TierSpec {
            id: id.to_string(),
            name: id.to_string(),
            priority,
            supports_js: false,
            supports_interaction: false,
            stealth_strength: 0,
            nominal_success_rate: 0.5,
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = TierCatalog::new(RouterConfig::default().tiers).unwrap();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.highest_stealth().id, "browser");
        assert_eq!(catalog.lowest_cost().id, "minimal_http");
        assert_eq!(catalog.mid_stealth().id, "proxy_http");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(TierCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let specs = vec![spec("a", 1), spec("a", 2)];
        assert!(TierCatalog::new(specs).is_err());
    }

    #[test]
    fn test_sparse_priorities_rejected() {
        let specs = vec![spec("a", 1), spec("b", 3)];
        assert!(TierCatalog::new(specs).is_err());
    }

    #[test]
    fn test_unordered_specs_sorted_by_priority() {
        let specs = vec![spec("low", 2), spec("high", 1)];
        let catalog = TierCatalog::new(specs).unwrap();
        assert_eq!(catalog.by_index(0).unwrap().id, "high");
        assert_eq!(catalog.index_of("low"), Some(1));
    }
}

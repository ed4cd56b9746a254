//! Tier selector
//!
//! Pure, reproducible mapping from (profile, intent, preferences) to the
//! priority index of the first tier to attempt. No hidden state, no
//! randomness; identical inputs always produce the identical tier.

use crate::routing::{
    catalog::TierCatalog,
    profiler::SiteProfile,
    types::{FetchIntent, FetchPreferences},
};

/// Choose the initial tier index for a cascade
///
/// Starts at the priority index of the profile's recommended tier, shifts
/// by the intent and preference deltas, and clamps into the catalog bounds.
/// An unknown recommended tier id falls back to the mid-ladder index.
pub fn select_tier_index(
    catalog: &TierCatalog,
    profile: &SiteProfile,
    intent: FetchIntent,
    preferences: &FetchPreferences,
) -> usize {
    let base = catalog
        .index_of(&profile.recommended_tier_id)
        .unwrap_or(catalog.len() / 2) as i32;

    let shifted = base + intent.index_delta() + preferences.index_delta();
    shifted.clamp(0, catalog.len() as i32 - 1) as usize
}

//! Adaptive multi-tier fetch routing
//!
//! Profiles a URL, selects a starting tier, cascades through the remaining
//! tiers on failure, and records per-domain outcome telemetry.

pub mod cascade;
pub mod catalog;
pub mod executor;
pub mod profiler;
pub mod router;
pub mod selector;
pub mod telemetry;
pub mod types;

pub use catalog::{TierCatalog, TierDescriptor};
pub use profiler::{SiteProfile, SiteProfiler};
pub use router::FetchRouter;
pub use telemetry::RoutingTelemetry;
pub use types::{FetchIntent, FetchPreferences, FetchRequest, FetchResult};

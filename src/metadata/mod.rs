//! Remote catalogue access.
//!
//! # Module layout
//!
//! - [`provider`] -- The [`MetadataService`] trait.
//! - [`providers`] -- Concrete services (Bangumi).
//! - [`cache`] -- TTL response cache that wraps any service.

pub mod cache;
pub mod provider;
pub mod providers;

pub use cache::CachedMetadataService;
pub use provider::MetadataService;
pub use providers::BangumiClient;

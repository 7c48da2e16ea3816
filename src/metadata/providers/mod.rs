//! Concrete metadata service implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`MetadataService`](super::MetadataService) trait.

pub mod bangumi;

pub use bangumi::BangumiClient;

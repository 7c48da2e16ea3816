//! Animatch - Anime episode resolution against the Bangumi catalogue
//!
//! This library crate exposes the resolution engine for hosts and for
//! integration testing.

pub mod classifier;
pub mod config;
pub mod continuity;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod matcher;
pub mod metadata;
pub mod naming;
pub mod overrides;
pub mod resolver;
pub mod title;

pub use error::{ResolveError, Result};
pub use resolver::{Placement, ResolveRequest, ResolvedEpisode, Resolver};

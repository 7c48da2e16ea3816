//! Animatch-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across animatch:
//!
//! - **Typed IDs**: Type-safe wrappers for catalogue subject and episode ids
//! - **Core Types**: Episode records, episode types, subjects and relations
//! - **Path Utilities**: Functions to detect file types by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use animatch_common::{EpisodeType, Error, Result, SubjectId};
//! use animatch_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let subject = SubjectId::new(69496);
//! assert_eq!(subject.get(), 69496);
//!
//! assert!(EpisodeType::Normal < EpisodeType::Special);
//! assert!(is_video_file(Path::new("White Album 2[01].mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("subject 1"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;

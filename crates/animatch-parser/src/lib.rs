//! # animatch-parser
//!
//! A tokenizer for anime release file names.
//!
//! Fansub and scene releases encode the episode number in many ways
//! (`- 03`, `[03]`, `E03`, `S01E03`, `#03`, `第03話`), often next to a
//! secondary numbering, a season or volume, a type keyword such as `NCOP`
//! or `OVA`, and encoding noise. This crate lexes the name with
//! [logos](https://docs.rs/logos) and returns those signals as optional
//! strings, leaving their interpretation to the caller.
//!
//! ## Quick Start
//!
//! ```
//! use animatch_parser::parse;
//!
//! let tokens = parse("[SweetSub] Kimetsu no Yaiba - 27 [1080p][AVC]");
//!
//! assert_eq!(tokens.release_group.as_deref(), Some("SweetSub"));
//! assert_eq!(tokens.title.as_deref(), Some("Kimetsu no Yaiba"));
//! assert_eq!(tokens.episode.as_deref(), Some("27"));
//! assert_eq!(tokens.episode_number(), Some(27.0));
//! ```
//!
//! ## Type keywords
//!
//! ```
//! use animatch_parser::parse;
//!
//! let tokens = parse("Show - NCOP2 [1080p]");
//! assert_eq!(tokens.anime_type.as_deref(), Some("NCOP"));
//! assert_eq!(tokens.episode.as_deref(), Some("2"));
//! ```

pub mod lexer;
pub mod model;
mod parser;

pub use model::ReleaseTokens;

/// Parse a release name into naming signals.
///
/// The input should be a bare file name with its extension already removed.
///
/// # Examples
///
/// ```
/// use animatch_parser::parse;
///
/// let tokens = parse("Show.Name.S02E05.The.Return.1080p.WEB-DL.x264");
/// assert_eq!(tokens.title.as_deref(), Some("Show Name"));
/// assert_eq!(tokens.season.as_deref(), Some("02"));
/// assert_eq!(tokens.episode.as_deref(), Some("05"));
/// assert_eq!(tokens.episode_title.as_deref(), Some("The Return"));
/// ```
pub fn parse(input: &str) -> ReleaseTokens {
    parser::parse(input)
}

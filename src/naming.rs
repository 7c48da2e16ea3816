//! Naming-signal tokenizer seam.

use animatch_parser::ReleaseTokens;

/// Extracts season, episode, volume, year and title tokens from a file name.
///
/// Implementations are pure: the same name always yields the same tokens.
pub trait NameTokenizer: Send + Sync {
    fn tokenize(&self, file_name: &str) -> ReleaseTokens;
}

/// [`NameTokenizer`] backed by `animatch-parser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameTokenizer;

impl NameTokenizer for ReleaseNameTokenizer {
    fn tokenize(&self, file_name: &str) -> ReleaseTokens {
        let stem = animatch_common::paths::strip_media_extension(file_name);
        animatch_parser::parse(stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_ignored() {
        let tokens = ReleaseNameTokenizer.tokenize("[Group] Mob Psycho 100 - 05 [1080p].mkv");
        assert_eq!(tokens.title.as_deref(), Some("Mob Psycho 100"));
        assert_eq!(tokens.episode_number(), Some(5.0));
    }
}

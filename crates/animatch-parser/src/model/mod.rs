//! Output model of the tokenizer.

/// Naming signals extracted from a release file name.
///
/// Every field is the raw text as written in the name (digits keep their
/// leading zeros), or `None` when the name carries no such signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReleaseTokens {
    /// Fansub or release group, from the leading bracket.
    pub release_group: Option<String>,
    /// Series title.
    pub title: Option<String>,
    /// Free text following the episode number.
    pub episode_title: Option<String>,
    /// Anime type keyword as written (`NCOP`, `ED2`, `SP`, `OVA`...).
    pub anime_type: Option<String>,
    /// Season number.
    pub season: Option<String>,
    /// Volume number.
    pub volume: Option<String>,
    /// Episode number, possibly fractional.
    pub episode: Option<String>,
    /// Alternate episode number from a secondary numbering scheme.
    pub episode_alt: Option<String>,
    /// Release year.
    pub year: Option<String>,
}

impl ReleaseTokens {
    /// Episode number as a float, when present and numeric.
    pub fn episode_number(&self) -> Option<f64> {
        self.episode.as_deref().and_then(parse_number)
    }

    /// Alternate episode number as a float, when present and numeric.
    pub fn episode_alt_number(&self) -> Option<f64> {
        self.episode_alt.as_deref().and_then(parse_number)
    }

    /// `true` when no field was extracted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_numbers_parse() {
        let tokens = ReleaseTokens {
            episode: Some("07".into()),
            episode_alt: Some("12.5".into()),
            ..Default::default()
        };
        assert_eq!(tokens.episode_number(), Some(7.0));
        assert_eq!(tokens.episode_alt_number(), Some(12.5));
    }

    #[test]
    fn non_numeric_episode_is_none() {
        let tokens = ReleaseTokens {
            episode: Some("x".into()),
            ..Default::default()
        };
        assert_eq!(tokens.episode_number(), None);
        assert!(!tokens.is_empty());
        assert!(ReleaseTokens::default().is_empty());
    }
}

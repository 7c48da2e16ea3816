//! Episode index extraction.
//!
//! A numeric value is read from the noise-stripped file name with an ordered
//! cascade of patterns. Whether that value replaces an index the caller
//! already knows is then decided by a fixed list of [`IndexRule`]s; the first
//! rule that returns a decision wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::ResolverConfig;

/// Numeric capture patterns, most specific first.
static CASCADE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\[([\d\.]{2,})\]",
        r"- ?([\d\.]{2,})",
        r"(?i)EP?([\d\.]{2,})",
        r"\[([\d\.]{2,})",
        r"#([\d\.]{2,})",
        r"(\d{2,})",
        r"\[([\d\.]+)\]",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Read an episode number from a noise-stripped name.
///
/// The first pattern whose capture parses as a number wins; a capture that
/// does not parse (`"1.2.3"`) moves on to the next pattern. Fractions are
/// kept as written.
pub fn index_from_name(stripped_name: &str) -> Option<f64> {
    CASCADE.iter().find_map(|pattern| {
        let raw = pattern.captures(stripped_name)?.get(1)?.as_str();
        raw.trim_matches('.')
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    })
}

/// Inputs the index rules decide between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexState {
    /// Value read from the file name, or the previous value when the name
    /// has none.
    pub from_name: f64,
    /// Index already assigned by the caller; 0 when unknown.
    pub previous: f64,
    /// Highest order the catalogue lists for this subject, when known.
    pub max_plausible: Option<f64>,
}

/// One step of the index precedence.
pub trait IndexRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The index to use, or `None` when the rule does not apply.
    fn decide(&self, state: &IndexState) -> Option<f64>;
}

/// The file name always wins.
pub struct ForcedReplace;

impl IndexRule for ForcedReplace {
    fn name(&self) -> &'static str {
        "forced_replace"
    }

    fn decide(&self, state: &IndexState) -> Option<f64> {
        Some(state.from_name)
    }
}

/// The name agrees with the caller.
pub struct SameAsPrevious;

impl IndexRule for SameAsPrevious {
    fn name(&self) -> &'static str {
        "same_as_previous"
    }

    fn decide(&self, state: &IndexState) -> Option<f64> {
        (state.from_name == state.previous).then_some(state.previous)
    }
}

/// The caller's index lies beyond anything the catalogue lists.
pub struct PreviousOutOfRange;

impl IndexRule for PreviousOutOfRange {
    fn name(&self) -> &'static str {
        "previous_out_of_range"
    }

    fn decide(&self, state: &IndexState) -> Option<f64> {
        let max = state.max_plausible?;
        (state.previous > max).then_some(state.from_name)
    }
}

/// The caller has no index yet.
pub struct FillEmpty;

impl IndexRule for FillEmpty {
    fn name(&self) -> &'static str {
        "fill_empty"
    }

    fn decide(&self, state: &IndexState) -> Option<f64> {
        (state.from_name > 0.0 && state.previous <= 0.0).then_some(state.from_name)
    }
}

/// Fallback: trust the caller.
pub struct KeepPrevious;

impl IndexRule for KeepPrevious {
    fn name(&self) -> &'static str {
        "keep_previous"
    }

    fn decide(&self, state: &IndexState) -> Option<f64> {
        Some(state.previous)
    }
}

/// Runs the index rules in their fixed order.
pub struct IndexExtractor {
    rules: Vec<Box<dyn IndexRule>>,
    prefer_tokenizer: bool,
}

impl IndexExtractor {
    /// Build the rule list for the given options.
    pub fn new(config: &ResolverConfig) -> Self {
        let mut rules: Vec<Box<dyn IndexRule>> = Vec::with_capacity(5);
        if config.always_replace_episode_number {
            rules.push(Box::new(ForcedReplace));
        }
        rules.push(Box::new(SameAsPrevious));
        rules.push(Box::new(PreviousOutOfRange));
        rules.push(Box::new(FillEmpty));
        rules.push(Box::new(KeepPrevious));

        Self {
            rules,
            prefer_tokenizer: config.always_get_episode_by_tokenizer,
        }
    }

    /// Names of the active rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Decide the episode index for a file.
    ///
    /// `tokenizer_episode` is the naming tokenizer's episode number; it is
    /// only consulted when the tokenizer is preferred.
    pub fn extract(
        &self,
        stripped_name: &str,
        previous: Option<f64>,
        max_plausible: Option<f64>,
        tokenizer_episode: Option<f64>,
    ) -> f64 {
        if self.prefer_tokenizer {
            if let Some(episode) = tokenizer_episode {
                debug!(index = episode, "Using tokenizer episode number");
                return episode;
            }
        }

        let previous = previous.unwrap_or(0.0);
        let state = IndexState {
            from_name: index_from_name(stripped_name).unwrap_or(previous),
            previous,
            max_plausible,
        };

        for rule in &self.rules {
            if let Some(index) = rule.decide(&state) {
                debug!(
                    rule = rule.name(),
                    index,
                    from_name = state.from_name,
                    previous = state.previous,
                    "Index rule applied"
                );
                return index;
            }
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::strip_noise;

    fn extractor() -> IndexExtractor {
        IndexExtractor::new(&ResolverConfig::default())
    }

    #[test]
    fn test_cascade_patterns() {
        assert_eq!(index_from_name("White Album 2[01][_][BDRip]"), Some(1.0));
        assert_eq!(index_from_name("Show - 27 []"), Some(27.0));
        assert_eq!(index_from_name("Show EP07"), Some(7.0));
        assert_eq!(index_from_name("Show #03"), Some(3.0));
        assert_eq!(index_from_name("Show 13"), Some(13.0));
        assert_eq!(index_from_name("Show [5]"), Some(5.0));
        assert_eq!(index_from_name("Show"), None);
    }

    #[test]
    fn test_fractions_are_kept() {
        assert_eq!(index_from_name(&strip_noise("Show - 12.5 [720p].mkv")), Some(12.5));
        assert_eq!(index_from_name("Show [12.5]"), Some(12.5));
    }

    #[test]
    fn test_unparseable_capture_falls_through() {
        // "1.2.3" does not parse; the bare digit run "10" does
        assert_eq!(index_from_name("Show [1.2.3] 10"), Some(10.0));
    }

    #[test]
    fn test_idempotent_under_noise() {
        let clean = extractor().extract(&strip_noise("07"), None, None, None);
        let noisy = extractor().extract(&strip_noise("Show [07][1080p][x264].mkv"), None, None, None);
        assert_eq!(clean, 7.0);
        assert_eq!(noisy, 7.0);
    }

    #[test]
    fn test_fill_empty() {
        assert_eq!(extractor().extract("Show - 05", None, None, None), 5.0);
        assert_eq!(extractor().extract("Show - 05", Some(0.0), None, None), 5.0);
    }

    #[test]
    fn test_keep_previous() {
        assert_eq!(extractor().extract("Show - 05", Some(3.0), None, None), 3.0);
        assert_eq!(extractor().extract("Show", Some(3.0), None, None), 3.0);
        assert_eq!(extractor().extract("Show", None, None, None), 0.0);
    }

    #[test]
    fn test_previous_out_of_range() {
        assert_eq!(extractor().extract("Show - 05", Some(30.0), Some(12.0), None), 5.0);
        assert_eq!(extractor().extract("Show - 05", Some(10.0), Some(12.0), None), 10.0);
    }

    #[test]
    fn test_forced_replace() {
        let config = ResolverConfig {
            always_replace_episode_number: true,
            ..Default::default()
        };
        let extractor = IndexExtractor::new(&config);
        assert_eq!(extractor.rule_names()[0], "forced_replace");
        assert_eq!(extractor.extract("Show - 05", Some(3.0), None, None), 5.0);
        assert_eq!(extractor.extract("Show", Some(3.0), None, None), 3.0);
    }

    #[test]
    fn test_prefer_tokenizer() {
        let config = ResolverConfig {
            always_get_episode_by_tokenizer: true,
            ..Default::default()
        };
        let extractor = IndexExtractor::new(&config);
        assert_eq!(extractor.extract("Show - 05", None, None, Some(8.0)), 8.0);
        assert_eq!(extractor.extract("Show - 05", None, None, None), 5.0);
    }

    #[test]
    fn test_rules_individually() {
        let state = IndexState {
            from_name: 4.0,
            previous: 4.0,
            max_plausible: None,
        };
        assert_eq!(SameAsPrevious.decide(&state), Some(4.0));
        assert_eq!(PreviousOutOfRange.decide(&state), None);
        assert_eq!(FillEmpty.decide(&state), None);
        assert_eq!(KeepPrevious.decide(&state), Some(4.0));
    }
}

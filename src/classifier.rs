//! File name classification.
//!
//! Release names carry encoding noise (resolutions, codecs, checksums,
//! version tags) whose digits look like episode numbers. [`strip_noise`]
//! removes it; [`classify`] then looks for Opening, Ending, Special and
//! Preview markers in that order.

use std::sync::LazyLock;

use animatch_common::paths::strip_media_extension;
use animatch_common::EpisodeType;
use regex::Regex;

/// Noise patterns, applied in order, with their replacement.
static NOISE: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // CRC32 checksum
        (r"(?i)[\[\(][0-9A-F]{8}[\]\)]", ""),
        (r"(?i)S\d{2,}", ""),
        (r"(?i)yuv[420]{3}p(10|8)?", ""),
        (r"(?i)\d{3,4}p", ""),
        (r"(?i)\d{3,4}x\d{3,4}", ""),
        (r"(?i)(Hi)?10p", ""),
        (r"(?i)(8|10)bit", ""),
        (r"(?i)(x|h)(264|265)", ""),
        // [YYMMDD] date stamps
        (r"\[\d{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])\]", ""),
        // v2 revision tags, but not the V of PV
        (r"(?i)([^P])V\d+", "${1}"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

static OPENING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^a-zA-Z])(?P<tok>(?:NC)?OP)(?:[^a-zA-Z]|$)").unwrap()
});

static ENDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^a-zA-Z])(?P<tok>(?:NC)?ED)(?:[^a-zA-Z]|$)").unwrap()
});

static SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^a-zA-Z])(?P<tok>SPs?|Specials?|OVA|OAD)(?:[^a-zA-Z]|$)").unwrap()
});

static PREVIEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w])(?P<tok>PV|CM)(?:[^a-zA-Z]|$)").unwrap()
});

/// Type rules in priority order. The first match wins.
fn type_rules() -> [(EpisodeType, &'static Regex); 4] {
    [
        (EpisodeType::Opening, &*OPENING),
        (EpisodeType::Ending, &*ENDING),
        (EpisodeType::Special, &*SPECIAL),
        (EpisodeType::Preview, &*PREVIEW),
    ]
}

/// Outcome of classifying a file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// The detected type, `None` when no marker was found.
    ///
    /// `None` means "unknown, assume Normal": the catalogue's own type is
    /// authoritative once a record is matched.
    pub episode_type: Option<EpisodeType>,
    /// The marker as written (`NCOP`, `ED`, `OVA`...).
    pub raw_token: Option<String>,
    /// `true` when the type came from the parent directory name.
    pub from_directory: bool,
}

impl Classification {
    /// The detected type, or [`EpisodeType::Normal`] when unknown.
    pub fn type_or_normal(&self) -> EpisodeType {
        self.episode_type.unwrap_or_default()
    }

    /// `true` when the file is Normal or its type is unknown.
    pub fn is_normal_or_unknown(&self) -> bool {
        matches!(self.episode_type, None | Some(EpisodeType::Normal))
    }
}

/// Remove encoding noise from a file name.
///
/// The media extension is dropped first so that container suffixes never
/// reach the patterns.
pub fn strip_noise(file_name: &str) -> String {
    let mut working = strip_media_extension(file_name).to_string();
    for (pattern, replacement) in NOISE.iter() {
        if pattern.is_match(&working) {
            working = pattern.replace_all(&working, *replacement).into_owned();
        }
    }
    working
}

fn classify_name(name: &str) -> Option<(EpisodeType, String)> {
    let working = strip_noise(name);
    type_rules().into_iter().find_map(|(episode_type, pattern)| {
        pattern
            .captures(&working)
            .and_then(|caps| caps.name("tok"))
            .map(|tok| (episode_type, tok.as_str().to_string()))
    })
}

/// Classify a file, falling back to its parent directory name.
///
/// A directory-derived type only fills a gap; it never overrides a type found
/// in the file name itself.
pub fn classify(file_name: &str, directory_name: Option<&str>) -> Classification {
    if let Some((episode_type, token)) = classify_name(file_name) {
        return Classification {
            episode_type: Some(episode_type),
            raw_token: Some(token),
            from_directory: false,
        };
    }

    match directory_name.and_then(classify_name) {
        Some((episode_type, token)) => Classification {
            episode_type: Some(episode_type),
            raw_token: Some(token),
            from_directory: true,
        },
        None => Classification::default(),
    }
}

/// `true` when the name carries any non-Normal marker.
pub fn is_special_file_name(file_name: &str) -> bool {
    let working = strip_noise(file_name);
    type_rules()
        .iter()
        .any(|(_, pattern)| pattern.is_match(&working))
}

/// `true` when the name carries a Special/OVA/OAD marker.
pub fn has_special_marker(file_name: &str) -> bool {
    SPECIAL.is_match(&strip_noise(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_noise() {
        assert_eq!(
            strip_noise("White Album 2[01][Hi10p_1080p][BDRip][x264_2flac].mkv"),
            "White Album 2[01][_][BDRip][_2flac]"
        );
        assert_eq!(strip_noise("Show - 03v2 [ABCD1234].mp4"), "Show - 03 ");
        assert_eq!(strip_noise("Show [210704][07].mkv"), "Show [07]");
        assert_eq!(strip_noise("Show PV2"), "Show PV2");
    }

    #[test]
    fn test_opening_stable_under_noise() {
        let noisy = classify("Show - OP1 [1080p][AAC].mkv", None);
        let clean = classify("Show-OP1.mkv", None);
        assert_eq!(noisy, clean);
        assert_eq!(noisy.episode_type, Some(EpisodeType::Opening));
        assert_eq!(noisy.raw_token.as_deref(), Some("OP"));
    }

    #[test]
    fn test_creditless_markers() {
        let result = classify("[Group] Show NCED2 [1080p].mkv", None);
        assert_eq!(result.episode_type, Some(EpisodeType::Ending));
        assert_eq!(result.raw_token.as_deref(), Some("NCED"));
    }

    #[test]
    fn test_special_and_preview() {
        assert_eq!(
            classify("[Group] Show OVA [BDRip].mkv", None).episode_type,
            Some(EpisodeType::Special)
        );
        assert_eq!(
            classify("Show SP01.mkv", None).episode_type,
            Some(EpisodeType::Special)
        );
        assert_eq!(
            classify("Show [PV01][1080p].mkv", None).episode_type,
            Some(EpisodeType::Preview)
        );
        assert_eq!(
            classify("Show CM2.mkv", None).episode_type,
            Some(EpisodeType::Preview)
        );
    }

    #[test]
    fn test_markers_inside_words_are_ignored() {
        assert_eq!(classify("SPEED GRAPHER - 03.mkv", None).episode_type, None);
        assert_eq!(classify("SHOP OWNER - 03.mkv", None).episode_type, None);
        assert_eq!(classify("TAPPED OUT - 01.mkv", None).episode_type, None);
    }

    #[test]
    fn test_opening_wins_over_special() {
        let result = classify("Show OVA NCOP.mkv", None);
        assert_eq!(result.episode_type, Some(EpisodeType::Opening));
    }

    #[test]
    fn test_normal_is_unknown() {
        let result = classify("White Album 2[01][Hi10p_1080p][BDRip][x264_2flac].mkv", None);
        assert_eq!(result.episode_type, None);
        assert_eq!(result.type_or_normal(), EpisodeType::Normal);
        assert!(result.is_normal_or_unknown());
    }

    #[test]
    fn test_directory_fills_gap_only() {
        let from_dir = classify("Show - 01.mkv", Some("SPs"));
        assert_eq!(from_dir.episode_type, Some(EpisodeType::Special));
        assert!(from_dir.from_directory);

        let from_file = classify("Show - NCOP.mkv", Some("SPs"));
        assert_eq!(from_file.episode_type, Some(EpisodeType::Opening));
        assert!(!from_file.from_directory);
    }

    #[test]
    fn test_special_file_names() {
        assert!(is_special_file_name("Show - NCED.mkv"));
        assert!(is_special_file_name("Show - OVA 2.mkv"));
        assert!(!is_special_file_name("Show - 05 [1080p].mkv"));
        assert!(has_special_marker("Show SP2.mkv"));
        assert!(!has_special_marker("Show - OP.mkv"));
    }
}

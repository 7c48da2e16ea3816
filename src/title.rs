//! Titles for episodes the catalogue has no name for.

use animatch_parser::ReleaseTokens;

fn prefixed(prefix: &str, value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("{prefix}{v}"))
}

/// Build a best-effort label from naming signals.
///
/// Joins, in this order and skipping empty parts: title, episode title, type
/// token, `S`+season, `V`+volume, `E`+episode and `(`alternate`)`.
///
/// ```
/// use animatch::title::synthesize_title;
/// use animatch_parser::parse;
///
/// let tokens = parse("[Group] Show - NCOP2 [1080p]");
/// assert_eq!(synthesize_title(&tokens, Some("NCOP")), "Show NCOP E2");
/// ```
pub fn synthesize_title(tokens: &ReleaseTokens, type_token: Option<&str>) -> String {
    let type_token = type_token.or(tokens.anime_type.as_deref());
    let alternate = tokens
        .episode_alt
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("({v})"));

    [
        prefixed("", tokens.title.as_deref()),
        prefixed("", tokens.episode_title.as_deref()),
        prefixed("", type_token),
        prefixed("S", tokens.season.as_deref()),
        prefixed("V", tokens.volume.as_deref()),
        prefixed("E", tokens.episode.as_deref()),
        alternate,
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

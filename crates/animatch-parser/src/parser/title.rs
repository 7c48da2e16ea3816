//! Release group, title and episode title extraction.

use super::episode::Layout;
use crate::lexer::{Lexeme, Lexer, Token};
use crate::model::ReleaseTokens;

/// Normalize a text fragment: scene-style dots and underscores become
/// spaces, whitespace collapses and stray separators at both ends go.
pub(crate) fn clean(raw: &str) -> Option<String> {
    let spaced = if raw.trim().contains(' ') {
        raw.replace('_', " ")
    } else {
        raw.replace(['.', '_'], " ")
    };
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '.' | '_' | '~' | ':' | ','));
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn has_words(lexemes: &[&Lexeme<'_>]) -> bool {
    lexemes
        .iter()
        .any(|l| matches!(l.token, Token::Word(_) | Token::Text(_)))
}

/// Index of the leading square bracket group naming the release group.
///
/// A leading group holding only an episode number or an encoding marker is
/// not a release group.
pub(crate) fn release_group(lexer: &Lexer<'_>) -> Option<usize> {
    let (index, group) = lexer.groups().iter().enumerate().find(|(_, g)| g.square)?;
    if !lexer.input()[..group.outer_span.start].trim().is_empty() {
        return None;
    }
    let content: Vec<_> = lexer.group_content(index).collect();
    let plausible = !content.is_empty()
        && content.iter().all(|l| !l.token.is_marker())
        && content.iter().any(|l| l.token.as_number().is_none());
    plausible.then_some(index)
}

/// Extract the title and episode title once markers are known.
pub(crate) fn extract(
    lexer: &Lexer<'_>,
    lexemes: &[&Lexeme<'_>],
    release_group: Option<usize>,
    layout: &Layout,
    out: &mut ReleaseTokens,
) {
    let input = lexer.input();
    let title_start = release_group
        .map(|g| lexer.groups()[g].outer_span.end)
        .unwrap_or(0);
    let title_end = layout.first_marker.unwrap_or(input.len());

    if title_end > title_start {
        out.title = clean(&input[title_start..title_end]);
    }
    if out.title.is_none() {
        out.title = bracketed_title(lexer, release_group, title_start);
    }

    if let Some(start) = layout.episode_end {
        let stop = lexemes
            .iter()
            .filter(|l| l.span.start >= start)
            .find(|l| {
                l.token.is_marker()
                    || matches!(l.token, Token::BracketOpen | Token::ParenOpen)
            })
            .map(|l| l.span.start)
            .unwrap_or(input.len());
        let words: Vec<_> = lexemes
            .iter()
            .filter(|l| l.span.start >= start && l.span.end <= stop)
            .copied()
            .collect();
        if stop > start && has_words(&words) {
            out.episode_title = clean(&input[start..stop]);
        }
    }
}

/// "[Group][Title][01]" names carry the title in a bracket of its own.
fn bracketed_title(lexer: &Lexer<'_>, release_group: Option<usize>, from: usize) -> Option<String> {
    lexer
        .groups()
        .iter()
        .enumerate()
        .filter(|(i, g)| g.square && Some(*i) != release_group && g.outer_span.start >= from)
        .find_map(|(i, g)| {
            let content: Vec<_> = lexer.group_content(i).collect();
            if has_words(&content) && content.iter().all(|l| !l.token.is_marker()) {
                clean(lexer.slice(g.inner_span))
            } else {
                None
            }
        })
}

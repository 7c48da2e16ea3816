//! Episode, season, volume and type extraction.
//!
//! Episode numbers are tried with an ordered list of rules, most explicit
//! first; the first rule that finds a number wins.

use crate::lexer::{Lexeme, Lexer, Token};
use crate::model::ReleaseTokens;

/// Positions the title extractor needs.
#[derive(Debug, Default)]
pub(crate) struct Layout {
    /// Byte offset of the first marker, bracket or noise token.
    pub first_marker: Option<usize>,
    /// Byte offset right after the episode number, when it sits outside
    /// brackets.
    pub episode_end: Option<usize>,
}

impl Layout {
    fn mark(&mut self, pos: usize) {
        self.first_marker = Some(self.first_marker.map_or(pos, |m| m.min(pos)));
    }
}

/// An episode number found by one of the rules.
struct Hit {
    value: String,
    /// Position of the lexeme carrying the number.
    pos: usize,
    /// Where the title must end at the latest.
    start: usize,
}

type EpisodeRule = fn(&Lexer<'_>, &[&Lexeme<'_>]) -> Option<Hit>;

const EPISODE_RULES: &[EpisodeRule] = &[
    season_episode,
    cjk_episode,
    prefixed,
    spelled_out,
    hash_prefixed,
    after_hyphen,
    bracketed,
    type_suffix,
    trailing_number,
];

/// Leading digit run of `s`, keeping a fractional part.
pub(crate) fn number_in(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    Some(rest[..len].trim_end_matches('.'))
}

fn alpha_prefix(s: &str) -> &str {
    let len = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    &s[..len]
}

fn next_content(lexemes: &[&Lexeme<'_>], pos: usize) -> Option<usize> {
    (pos + 1..lexemes.len()).find(|&i| !lexemes[i].token.is_delimiter())
}

fn season_episode(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| match l.token {
        Token::SeasonEpisode(s) => {
            let e = s.find(['E', 'e'])?;
            Some(Hit {
                value: number_in(&s[e..])?.to_string(),
                pos,
                start: l.span.start,
            })
        }
        _ => None,
    })
}

fn cjk_episode(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| match l.token {
        Token::CjkEpisode(s) => Some(Hit {
            value: number_in(s)?.to_string(),
            pos,
            start: l.span.start,
        }),
        _ => None,
    })
}

fn prefixed(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| match l.token {
        Token::EpisodeNumber(s) => Some(Hit {
            value: number_in(s)?.to_string(),
            pos,
            start: l.span.start,
        }),
        _ => None,
    })
}

fn spelled_out(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| {
        if !matches!(l.token, Token::EpisodeWord(_)) {
            return None;
        }
        let next = next_content(lexemes, pos)?;
        let value = lexemes[next].token.as_number()?;
        Some(Hit {
            value: value.to_string(),
            pos: next,
            start: l.span.start,
        })
    })
}

fn hash_prefixed(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| match l.token {
        Token::HashNumber(s) => Some(Hit {
            value: number_in(s)?.to_string(),
            pos,
            start: l.span.start,
        }),
        _ => None,
    })
}

fn after_hyphen(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.windows(2).enumerate().find_map(|(pos, pair)| {
        let (dash, num) = (pair[0], pair[1]);
        if dash.token != Token::Hyphen || num.in_brackets() {
            return None;
        }
        Some(Hit {
            value: num.token.as_number()?.to_string(),
            pos: pos + 1,
            start: dash.span.start,
        })
    })
}

fn bracketed(lexer: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexer.groups().iter().enumerate().find_map(|(g, group)| {
        if !group.square {
            return None;
        }
        let content: Vec<_> = lexer.group_content(g).collect();
        let number = match content.as_slice() {
            [n] => n,
            [n, v] if matches!(v.token, Token::Version(_)) => n,
            _ => return None,
        };
        let value = number.token.as_number()?;
        let pos = lexemes.iter().position(|l| l.span == number.span)?;
        Some(Hit {
            value: value.to_string(),
            pos,
            start: group.outer_span.start,
        })
    })
}

fn type_suffix(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    lexemes.iter().enumerate().find_map(|(pos, l)| match l.token {
        Token::OpeningEnding(s) | Token::TypeKeyword(s) => Some(Hit {
            value: number_in(s)?.to_string(),
            pos,
            start: l.span.start,
        }),
        _ => None,
    })
}

/// A bare number that closes the name, e.g. "Show 03 [1080p]".
fn trailing_number(_: &Lexer<'_>, lexemes: &[&Lexeme<'_>]) -> Option<Hit> {
    let pos = lexemes.iter().rposition(|l| {
        !l.in_brackets()
            && !l.token.is_delimiter()
            && !l.token.is_noise()
            && !matches!(
                l.token,
                Token::Version(_)
                    | Token::BracketOpen
                    | Token::BracketClose
                    | Token::ParenOpen
                    | Token::ParenClose
            )
    })?;
    let lexeme = lexemes[pos];
    let value = lexeme.token.as_number()?;
    let after_season_word = lexemes[..pos]
        .iter()
        .rev()
        .find(|l| !l.token.is_delimiter())
        .is_some_and(|l| matches!(l.token, Token::SeasonWord(_)));
    let has_text_before = lexemes[..pos]
        .iter()
        .any(|l| !l.in_brackets() && matches!(l.token, Token::Word(_) | Token::Text(_)));
    (has_text_before && !after_season_word).then(|| Hit {
        value: value.to_string(),
        pos,
        start: lexeme.span.start,
    })
}

/// `12 (48)`: a parenthesized number right after the episode.
fn alternate(lexemes: &[&Lexeme<'_>], pos: usize) -> Option<(String, usize)> {
    let open = next_content(lexemes, pos)?;
    let num = next_content(lexemes, open)?;
    let close = next_content(lexemes, num)?;
    if lexemes[open].token != Token::ParenOpen || lexemes[close].token != Token::ParenClose {
        return None;
    }
    let value = lexemes[num].token.as_number()?;
    Some((value.to_string(), lexemes[close].span.end))
}

/// Extract episode, alternate episode, season, volume, type and year.
pub(crate) fn extract(
    lexer: &Lexer<'_>,
    lexemes: &[&Lexeme<'_>],
    out: &mut ReleaseTokens,
) -> Layout {
    let mut layout = Layout::default();

    for (pos, l) in lexemes.iter().enumerate() {
        match l.token {
            Token::SeasonEpisode(s) => {
                if out.season.is_none() {
                    out.season = number_in(s).map(str::to_string);
                }
            }
            Token::Season(s) | Token::CjkSeason(s) => {
                if out.season.is_none() {
                    out.season = number_in(s).map(str::to_string);
                }
            }
            Token::SeasonWord(_) => {
                if out.season.is_none() {
                    out.season = next_content(lexemes, pos)
                        .and_then(|n| lexemes[n].token.as_number())
                        .map(str::to_string);
                }
            }
            Token::Volume(s) => {
                if out.volume.is_none() {
                    out.volume = number_in(s).map(str::to_string);
                }
            }
            Token::OpeningEnding(s) | Token::TypeKeyword(s) => {
                if out.anime_type.is_none() {
                    out.anime_type = Some(alpha_prefix(s).to_string());
                }
            }
            Token::Year(y) => {
                if out.year.is_none() {
                    out.year = Some(y.to_string());
                }
            }
            _ => {}
        }

        if l.token.is_marker() || matches!(l.token, Token::BracketOpen | Token::ParenOpen) {
            layout.mark(l.span.start);
        }
    }

    let Some(hit) = EPISODE_RULES.iter().find_map(|rule| rule(lexer, lexemes)) else {
        return layout;
    };
    layout.mark(hit.start);
    out.episode = Some(hit.value);

    let episode = lexemes[hit.pos];
    if episode.in_brackets() {
        return layout;
    }
    let mut end = episode.span.end;
    if let Some(version) = lexemes.get(hit.pos + 1) {
        if matches!(version.token, Token::Version(_)) && version.span.start == end {
            end = version.span.end;
        }
    }
    if let Some((alt, alt_end)) = alternate(lexemes, hit.pos) {
        out.episode_alt = Some(alt);
        end = alt_end;
    }
    layout.episode_end = Some(end);
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_in() {
        assert_eq!(number_in("S01E05"), Some("01"));
        assert_eq!(number_in("E05v2"), Some("05"));
        assert_eq!(number_in("第6.5话"), Some("6.5"));
        assert_eq!(number_in("Vol.03"), Some("03"));
        assert_eq!(number_in("OVA"), None);
    }

    #[test]
    fn test_alpha_prefix() {
        assert_eq!(alpha_prefix("NCOP2"), "NCOP");
        assert_eq!(alpha_prefix("SP02"), "SP");
        assert_eq!(alpha_prefix("OVA"), "OVA");
    }
}

//! Extraction of naming signals from the token stream.
//!
//! Markers (episode, season, volume, type) are located first; the title is
//! whatever text precedes the first of them.

mod episode;
mod title;

use crate::lexer::{Lexeme, Lexer};
use crate::model::ReleaseTokens;

/// Parse a release name into naming signals.
pub fn parse(input: &str) -> ReleaseTokens {
    let lexer = Lexer::new(input);
    let mut tokens = ReleaseTokens::default();

    let group = title::release_group(&lexer);
    let group_span = group.map(|g| lexer.groups()[g].outer_span);
    if let Some(g) = group {
        let name = lexer.slice(lexer.groups()[g].inner_span).trim();
        tokens.release_group = (!name.is_empty()).then(|| name.to_string());
    }

    // Tokens of the release group never feed any other field.
    let lexemes: Vec<&Lexeme<'_>> = lexer
        .lexemes()
        .iter()
        .filter(|l| group_span.map_or(true, |g| !g.contains(&l.span)))
        .collect();

    let layout = episode::extract(&lexer, &lexemes, &mut tokens);
    title::extract(&lexer, &lexemes, group, &layout, &mut tokens);
    tokens
}

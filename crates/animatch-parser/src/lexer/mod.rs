//! Logos-based lexer for anime release names.
//!
//! This module provides tokenization using the [logos](https://docs.rs/logos) crate,
//! which generates a fast lexer from regex patterns at compile time. Characters
//! no pattern accepts (`:`, `!`, `~`...) are dropped from the token stream but
//! stay in the input, so text fields are always sliced from spans.

mod token;
pub use token::Token;

use logos::Logos;
use std::ops::Range;

/// Byte span in the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another one.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// A detected bracket group in the input.
///
/// Represents a matched pair of brackets (`[...]`, `【...】`, `(...)` or
/// `（...）`) with spans for both the entire group and the content inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketGroup {
    /// The span of the entire bracket group including brackets.
    pub outer_span: Span,
    /// The span of the content inside the brackets.
    pub inner_span: Span,
    /// `true` for square brackets, `false` for parentheses.
    pub square: bool,
}

/// Find all top-level and nested bracket groups in the input, in order of
/// their opening bracket.
pub fn find_bracket_groups(input: &str) -> Vec<BracketGroup> {
    let mut groups = Vec::new();
    let mut stack: Vec<(usize, usize, bool)> = Vec::new();

    for (i, ch) in input.char_indices() {
        match ch {
            '[' | '【' => stack.push((i, ch.len_utf8(), true)),
            '(' | '（' => stack.push((i, ch.len_utf8(), false)),
            ']' | '】' | ')' | '）' => {
                let square = matches!(ch, ']' | '】');
                if let Some(&(start, open_len, open_square)) = stack.last() {
                    if open_square == square {
                        stack.pop();
                        groups.push(BracketGroup {
                            outer_span: Span::new(start, i + ch.len_utf8()),
                            inner_span: Span::new(start + open_len, i),
                            square,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    groups.sort_by_key(|g| g.outer_span.start);
    groups
}

/// A token together with its position and bracket context.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme<'src> {
    /// The classified token.
    pub token: Token<'src>,
    /// Byte span in the original input.
    pub span: Span,
    /// Index into [`Lexer::groups`] of the innermost group enclosing this
    /// token, if any. Bracket tokens themselves are not enclosed by their
    /// own group.
    pub group: Option<usize>,
}

impl Lexeme<'_> {
    /// Whether this token sits inside any bracket group.
    pub fn in_brackets(&self) -> bool {
        self.group.is_some()
    }
}

/// A lexer that tokenizes release names using Logos and records which
/// bracket group each token belongs to.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    lexemes: Vec<Lexeme<'src>>,
    groups: Vec<BracketGroup>,
    input: &'src str,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given input.
    ///
    /// Tokenizes the entire input string immediately.
    pub fn new(input: &'src str) -> Self {
        let groups = find_bracket_groups(input);
        let lexemes = Token::lexer(input)
            .spanned()
            .filter_map(|(tok, range)| tok.ok().map(|t| (t, Span::from(range))))
            .map(|(token, span)| {
                let group = groups
                    .iter()
                    .enumerate()
                    .filter(|(_, g)| g.inner_span.contains(&span))
                    .max_by_key(|(_, g)| g.inner_span.start)
                    .map(|(i, _)| i);
                Lexeme { token, span, group }
            })
            .collect();

        Self {
            lexemes,
            groups,
            input,
        }
    }

    /// Get all tokens with their spans.
    pub fn lexemes(&self) -> &[Lexeme<'src>] {
        &self.lexemes
    }

    /// Get all bracket groups.
    pub fn groups(&self) -> &[BracketGroup] {
        &self.groups
    }

    /// Get the original input string.
    pub fn input(&self) -> &'src str {
        self.input
    }

    /// Slice the original input.
    pub fn slice(&self, span: Span) -> &'src str {
        &self.input[span.start..span.end]
    }

    /// Non-delimiter tokens directly inside the given group.
    pub fn group_content(&self, group: usize) -> impl Iterator<Item = &Lexeme<'src>> {
        self.lexemes
            .iter()
            .filter(move |l| l.group == Some(group) && !l.token.is_delimiter())
    }
}

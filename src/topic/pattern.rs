//! Pattern compilation.
//!
//! # Responsibilities
//! - Translate a validated pattern into a token program
//! - Render the canonical textual form of that program
//! - Evaluate routing keys against the program
//!
//! # Design Decisions
//! - Only three constructs get special meaning: the separator, `*`, `#`
//! - Every other byte is a literal; nothing from user input is ever
//!   interpreted by a general-purpose matching engine
//! - Anchored at both ends: the whole key must be consumed
//! - Evaluation is a bitset walk over (token, key offset) states, so a
//!   key is checked in O(tokens × key length) without backtracking

use std::fmt;

use super::grammar::{HASH, SEPARATOR, STAR};

const SEPARATOR_BYTE: u8 = SEPARATOR as u8;

/// One step of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Token {
    /// Exactly this byte.
    Literal(u8),
    /// Exactly one separator.
    Separator,
    /// One or more non-separator bytes (`*`).
    Segment,
    /// Zero or more bytes of any kind, separators included (`#`).
    Any,
}

impl Token {
    fn render(self, out: &mut String) {
        match self {
            Token::Literal(b) => out.push(b as char),
            Token::Separator => out.push_str("\\."),
            Token::Segment => out.push_str("[^.]+"),
            Token::Any => out.push_str(".*"),
        }
    }
}

/// Compiled, reusable form of a topic pattern.
///
/// Two matchers compiled from the same pattern text are equal, and so are
/// their canonical forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledMatcher {
    pattern: String,
    tokens: Vec<Token>,
    canonical: String,
}

/// Compiles a pattern that has already passed `validate_topic_pattern`.
pub fn compile(pattern: &str) -> CompiledMatcher {
    let tokens: Vec<Token> = pattern
        .bytes()
        .map(|b| match b as char {
            SEPARATOR => Token::Separator,
            STAR => Token::Segment,
            HASH => Token::Any,
            _ => Token::Literal(b),
        })
        .collect();

    let mut canonical = String::with_capacity(pattern.len() * 2 + 2);
    canonical.push('^');
    for token in &tokens {
        token.render(&mut canonical);
    }
    canonical.push('$');

    CompiledMatcher {
        pattern: pattern.to_string(),
        tokens,
        canonical,
    }
}

impl CompiledMatcher {
    /// The pattern text this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Canonical anchored expression, e.g. `^logs\.[^.]+$` for `logs.*`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// The first segment when it contains no wildcard, used to index
    /// bindings by the first segment of a routing key.
    pub fn first_literal_segment(&self) -> Option<&str> {
        let first = self.pattern.split(SEPARATOR).next()?;
        if first.contains([STAR, HASH]) {
            None
        } else {
            Some(first)
        }
    }

    /// Returns true if the whole routing key matches this pattern.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.as_bytes();
        let len = key.len();

        // reach[j]: the tokens consumed so far can match exactly key[..j].
        let mut reach = vec![false; len + 1];
        let mut next = vec![false; len + 1];
        reach[0] = true;

        for token in &self.tokens {
            match *token {
                Token::Literal(b) => {
                    next[0] = false;
                    for j in 1..=len {
                        next[j] = reach[j - 1] && key[j - 1] == b;
                    }
                }
                Token::Separator => {
                    next[0] = false;
                    for j in 1..=len {
                        next[j] = reach[j - 1] && key[j - 1] == SEPARATOR_BYTE;
                    }
                }
                Token::Segment => {
                    next[0] = false;
                    for j in 1..=len {
                        next[j] = key[j - 1] != SEPARATOR_BYTE && (reach[j - 1] || next[j - 1]);
                    }
                }
                Token::Any => {
                    let mut seen = false;
                    for j in 0..=len {
                        seen |= reach[j];
                        next[j] = seen;
                    }
                }
            }
            std::mem::swap(&mut reach, &mut next);
            if !reach.contains(&true) {
                return false;
            }
        }

        reach[len]
    }
}

impl fmt::Display for CompiledMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

//! Routing key and topic pattern validation.
//!
//! # Responsibilities
//! - Check the shared lexical rules (length, dot placement, alphabet)
//! - Check the wildcard rules that only apply to patterns
//!
//! # Design Decisions
//! - Rules run in a fixed priority order; the first violation is reported
//! - The alphabet is an allow-list: `[A-Za-z0-9_-]`, the separator, and
//!   for patterns `*` and `#`. Anything else is rejected outright.

use crate::error::{Subject, ValidationError};

/// Segment separator shared by keys and patterns.
pub const SEPARATOR: char = '.';

/// Maximum length of a routing key or pattern, in characters.
pub const MAX_LENGTH: usize = 255;

/// Matches exactly one segment.
pub const STAR: char = '*';

/// Matches zero or more segments.
pub const HASH: char = '#';

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Checks the rules common to keys and patterns, up to and including
/// the consecutive-dot check.
fn check_structure(s: &str, subject: Subject) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::EmptyOrNull(subject));
    }
    if s.chars().count() > MAX_LENGTH {
        return Err(ValidationError::TooLong(subject));
    }
    if s.starts_with(SEPARATOR) {
        return Err(ValidationError::LeadingDot(subject));
    }
    if s.ends_with(SEPARATOR) {
        return Err(ValidationError::TrailingDot(subject));
    }
    if s.contains("..") {
        return Err(ValidationError::ConsecutiveDots(subject));
    }
    Ok(())
}

/// Validates a routing key.
///
/// Callers holding an optional value pass `""` for a missing one; both
/// are reported as `EmptyOrNull`.
pub fn validate_routing_key(key: &str) -> Result<(), ValidationError> {
    let subject = Subject::RoutingKey;
    check_structure(key, subject)?;

    if !key.chars().all(|c| is_word_char(c) || c == SEPARATOR) {
        return Err(ValidationError::InvalidCharacters(subject));
    }
    Ok(())
}

/// Validates a topic pattern.
pub fn validate_topic_pattern(pattern: &str) -> Result<(), ValidationError> {
    let subject = Subject::TopicPattern;
    check_structure(pattern, subject)?;

    if pattern.contains("**") {
        return Err(ValidationError::ConsecutiveStars(subject));
    }
    if pattern.contains("##") {
        return Err(ValidationError::ConsecutiveHashes(subject));
    }
    if pattern.contains("*#") || pattern.contains("#*") {
        return Err(ValidationError::AdjacentWildcards(subject));
    }

    if !pattern
        .chars()
        .all(|c| is_word_char(c) || c == SEPARATOR || c == STAR || c == HASH)
    {
        return Err(ValidationError::InvalidCharacters(subject));
    }
    Ok(())
}

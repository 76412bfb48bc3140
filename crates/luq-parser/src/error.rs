//! Error types for query parsing.
//!
//! Every failure carries the kind of error, the byte offset where it was
//! detected, and the original query string for context rendering.

use std::fmt;

use thiserror::Error;

/// The category of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tokenization failed: malformed token such as an unterminated
    /// phrase, an invalid escape, or a stray character.
    Lex,
    /// The token sequence is structurally invalid: missing operand,
    /// conflicting modifiers, invalid boost/fuzzy value, trailing input.
    Grammar,
    /// A configured resource limit (nesting depth) was exceeded.
    ResourceLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lex => "lex error",
            Self::Grammar => "grammar error",
            Self::ResourceLimit => "resource limit exceeded",
        };
        write!(f, "{name}")
    }
}

/// A query parse failure with position information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}: {message}")]
pub struct ParseError {
    /// The category of failure.
    pub kind: ErrorKind,
    /// 0-based byte offset in the input where the failure was detected.
    pub offset: usize,
    /// Human-readable description referencing the offending token text.
    pub message: String,
    /// The original query string.
    pub query: String,
}

impl ParseError {
    /// Creates a lex error.
    pub(crate) fn lex(message: impl Into<String>, offset: usize, query: &str) -> Self {
        Self::new(ErrorKind::Lex, message, offset, query)
    }

    /// Creates a grammar error.
    pub(crate) fn grammar(message: impl Into<String>, offset: usize, query: &str) -> Self {
        Self::new(ErrorKind::Grammar, message, offset, query)
    }

    /// Creates a resource limit error.
    pub(crate) fn resource_limit(message: impl Into<String>, offset: usize, query: &str) -> Self {
        Self::new(ErrorKind::ResourceLimit, message, offset, query)
    }

    /// Creates an error of the given kind.
    fn new(kind: ErrorKind, message: impl Into<String>, offset: usize, query: &str) -> Self {
        Self {
            kind,
            offset,
            message: message.into(),
            query: query.to_string(),
        }
    }

    /// Formats the error with the query and a caret marking where the
    /// error occurred.
    pub fn format_with_context(&self) -> String {
        let mut result = String::new();
        result.push_str(&format!("{}: {}\n", self.kind, self.message));
        result.push_str(&format!("  {}\n", self.query));
        let clamped = self.offset.min(self.query.len());
        let columns = self.query[..clamped].chars().count();
        result.push_str(&format!("  {}^", " ".repeat(columns)));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind_offset_message() {
        let err = ParseError::grammar("unexpected ':'", 9, "field:a:b");
        assert_eq!(err.to_string(), "grammar error at offset 9: unexpected ':'");
    }

    #[test]
    fn context_points_at_offset() {
        let err = ParseError::lex("unterminated phrase", 4, "abc \"def");
        let rendered = err.format_with_context();
        assert_eq!(
            rendered,
            "lex error: unterminated phrase\n  abc \"def\n      ^"
        );
    }

    #[test]
    fn context_caret_clamps_to_input_length() {
        let err = ParseError::grammar("unexpected end of query", 4, "a OR");
        let rendered = err.format_with_context();
        assert!(rendered.ends_with("  a OR\n      ^"));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::Lex.to_string(), "lex error");
        assert_eq!(ErrorKind::Grammar.to_string(), "grammar error");
        assert_eq!(
            ErrorKind::ResourceLimit.to_string(),
            "resource limit exceeded"
        );
    }
}

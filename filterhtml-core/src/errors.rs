//! errors.rs - Custom error types for the filterhtml-core library.
//!
//! Sanitization has exactly two fatal outcomes: a structural error (tags that do
//! not nest) and a syntax error (an attribute quote that never closes). Both abort
//! the whole call. The remaining variants report a whitelist that fails to compile
//! or validate, or a text filter whose output keeps nesting.
//!
//! License: MIT OR APACHE 2.0

use std::fmt;
use thiserror::Error;

/// A location in the input, used to point at the offending markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 0-based column of the character on its line.
    pub column: usize,
    /// Character offset from the start of the input.
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Broad classification of a [`FilterHtmlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tag nesting is broken: unclosed, unexpected or mismatched tags.
    Structural,
    /// The markup itself cannot be tokenized (unterminated attribute quote).
    Syntax,
    /// The whitelist or the engine options are invalid.
    Configuration,
    Other,
}

/// This enum represents all possible error types in the `filterhtml-core` library.
///
/// `#[non_exhaustive]` lets new variants be added without breaking callers that
/// match on it.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FilterHtmlError {
    #[error("Tags not closed: {} (end of input at {position})", .tags.join(", "))]
    UnclosedTags { tags: Vec<String>, position: Position },

    #[error("Closing tag </{tag}> has no matching opening tag at {position}")]
    UnexpectedClosingTag { tag: String, position: Position },

    #[error("Opening tag <{open}> does not match closing tag </{close}> at {position}")]
    MismatchedClosingTag {
        open: String,
        close: String,
        position: Position,
    },

    #[error("Attribute quote not closed: <{tag} {attribute}> at {position}")]
    UnterminatedQuote {
        tag: String,
        attribute: String,
        position: Position,
    },

    #[error("Text filter output re-sanitized more than {0} levels deep")]
    RewriteDepthExceeded(usize),

    #[error("Failed to compile pattern for '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Alias cycle detected: {}", .0.join(" -> "))]
    AliasCycle(Vec<String>),

    #[error("Invalid rule for '{0}': {1}")]
    InvalidRule(String, String),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}

impl FilterHtmlError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterHtmlError::UnclosedTags { .. }
            | FilterHtmlError::UnexpectedClosingTag { .. }
            | FilterHtmlError::MismatchedClosingTag { .. } => ErrorKind::Structural,
            FilterHtmlError::UnterminatedQuote { .. } => ErrorKind::Syntax,
            FilterHtmlError::RuleCompilationError(..)
            | FilterHtmlError::PatternLengthExceeded(..)
            | FilterHtmlError::AliasCycle(_)
            | FilterHtmlError::InvalidRule(..) => ErrorKind::Configuration,
            _ => ErrorKind::Other,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }

    pub fn is_syntax(&self) -> bool {
        self.kind() == ErrorKind::Syntax
    }

    /// The input position the error points at, when it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            FilterHtmlError::UnclosedTags { position, .. }
            | FilterHtmlError::UnexpectedClosingTag { position, .. }
            | FilterHtmlError::MismatchedClosingTag { position, .. }
            | FilterHtmlError::UnterminatedQuote { position, .. } => Some(*position),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_message_names_every_open_tag() {
        let err = FilterHtmlError::UnclosedTags {
            tags: vec!["div".to_string(), "b".to_string()],
            position: Position { line: 3, column: 7, offset: 40 },
        };
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "Tags not closed: div, b (end of input at 3:7)");
    }

    #[test]
    fn test_kind_classification() {
        let syntax = FilterHtmlError::UnterminatedQuote {
            tag: "span".to_string(),
            attribute: "id".to_string(),
            position: Position::default(),
        };
        assert!(syntax.is_syntax());
        assert_eq!(syntax.position(), Some(Position::default()));

        let cycle = FilterHtmlError::AliasCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(cycle.kind(), ErrorKind::Configuration);
        assert_eq!(cycle.to_string(), "Alias cycle detected: a -> b -> a");
        assert!(cycle.position().is_none());
    }
}

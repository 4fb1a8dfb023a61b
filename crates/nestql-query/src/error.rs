//! Error types for query parsing.
//!
//! Lexing and parsing produce internal errors with position information;
//! both surface to callers as [`InvalidQuery`], which carries the original
//! input and renders one of two user-facing message forms.

use std::fmt;

use thiserror::Error;

/// Marker phrase used by the parser when no production can start at the
/// current token. Diagnostics containing it render as the "format error"
/// message form.
pub(crate) const EXPECTING_ONE_OF: &str = "expecting one of";

/// Tokenizer error with a byte position into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {position})")]
pub(crate) struct LexError {
    /// Error message.
    pub message: String,
    /// Byte position in the input where the error occurred.
    pub position: usize,
}

impl LexError {
    /// Creates a new tokenizer error.
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parser error with the index of the offending token, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseError {
    /// Error message.
    pub message: String,
    /// Token index where the error occurred.
    pub token_index: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_index {
            Some(index) => write!(f, "{} (at token {})", self.message, index),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        Self {
            message: err.to_string(),
            token_index: None,
        }
    }
}

/// A query string that could not be compiled.
///
/// The two variants are message forms, not distinct failure classes: a
/// diagnostic saying the query could not start at all renders as [`Format`],
/// everything else as [`Syntax`].
///
/// [`Format`]: InvalidQuery::Format
/// [`Syntax`]: InvalidQuery::Syntax
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuery {
    /// The parser could not start: the input does not begin with anything
    /// the grammar accepts.
    #[error("Invalid query format. Query must start with a field name or keyword. Got: {input}")]
    Format {
        /// The original query string.
        input: String,
    },

    /// The input started like a query but failed somewhere inside.
    #[error("Invalid query string: {input}. {detail}")]
    Syntax {
        /// The original query string.
        input: String,
        /// The parser's diagnostic.
        detail: String,
    },
}

impl InvalidQuery {
    /// Classifies a parser diagnostic into the matching message form.
    pub(crate) fn new(input: &str, detail: String) -> Self {
        if detail.contains(EXPECTING_ONE_OF) {
            Self::Format {
                input: input.to_string(),
            }
        } else {
            Self::Syntax {
                input: input.to_string(),
                detail,
            }
        }
    }

    /// Returns the original query string.
    pub fn input(&self) -> &str {
        match self {
            Self::Format { input } | Self::Syntax { input, .. } => input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_form_for_no_viable_start() {
        let err = InvalidQuery::new(">invalid", format!("{EXPECTING_ONE_OF}: a keyword"));
        assert_eq!(
            err.to_string(),
            "Invalid query format. Query must start with a field name or keyword. Got: >invalid"
        );
    }

    #[test]
    fn generic_form_for_other_diagnostics() {
        let err = InvalidQuery::new("(field:value", "expected closing parenthesis".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid query string: (field:value. expected closing parenthesis"
        );
    }

    #[test]
    fn input_accessor() {
        let err = InvalidQuery::new("a b", "detail".to_string());
        assert_eq!(err.input(), "a b");
    }
}

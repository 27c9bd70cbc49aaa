//! Error types for query parsing.
//!
//! The grammar engine reports where matching got furthest and what it expected there.
//! This module turns that into a [`ParseError`] with a kind the caller can act on, and
//! renders it against the query text on request.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::de;

use crate::{
    grammar::{Expected, Failure},
    lexical::{self, FIELD_SEPARATOR},
};

/// The kind of syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParseErrorKind {
    /// A quote was opened and never closed.
    UnterminatedQuote,
    /// A `:` with no field name before it.
    EmptyFieldName,
    /// Nothing in the grammar matches at this position.
    UnexpectedCharacter,
    /// Quotes with no term between them.
    EmptyPhrase,
}

impl ParseErrorKind {
    /// Returns a short description of the error.
    pub fn description(self) -> &'static str {
        match self {
            Self::UnterminatedQuote => "unterminated quote",
            Self::EmptyFieldName => "empty field name",
            Self::UnexpectedCharacter => "unexpected character",
            Self::EmptyPhrase => "empty phrase",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A query syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    /// Byte offset of the error in the query.
    pub position: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// What the grammar would have accepted at the furthest point it reached.
    #[serde(default)]
    pub expected: Vec<Expected>,
}

impl ParseError {
    /// Creates an error with no expectation list.
    pub fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self {
            position,
            kind,
            expected: Vec::new(),
        }
    }

    /// Classifies a grammar failure on `input`.
    ///
    /// - Failing inside a quoted term whose quote is never closed is an unterminated quote,
    ///   reported at the opening quote.
    /// - A `:` with no field name character before it is an empty field name.
    /// - Anything else is an unexpected character (which may be the end of input).
    pub fn from_failure(input: &str, failure: Failure) -> Self {
        let Failure {
            position,
            expected,
            open_quote,
        } = failure;

        if let Some(quote) = open_quote
            && !lexical::is_closed_quote(input, quote)
        {
            return Self {
                position: quote,
                kind: ParseErrorKind::UnterminatedQuote,
                expected,
            };
        }

        let at_separator = input
            .get(position..)
            .is_some_and(|rest| rest.starts_with(FIELD_SEPARATOR));
        let kind = if at_separator && !lexical::follows_field_name(input, position) {
            ParseErrorKind::EmptyFieldName
        } else {
            ParseErrorKind::UnexpectedCharacter
        };

        Self {
            position,
            kind,
            expected,
        }
    }

    /// Returns a one-line message for this error against the query it came from.
    pub fn message(&self, input: &str) -> String {
        let found = input.get(self.position..).and_then(|rest| rest.chars().next());
        let mut message = match (self.kind, found) {
            (ParseErrorKind::UnexpectedCharacter, Some(ch)) => {
                format!("unexpected character {ch:?}")
            }
            (ParseErrorKind::UnexpectedCharacter, None) => "unexpected end of query".to_string(),
            (kind, _) => kind.to_string(),
        };
        if self.kind == ParseErrorKind::UnexpectedCharacter && !self.expected.is_empty() {
            let expected: Vec<String> = self.expected.iter().map(ToString::to_string).collect();
            message.push_str(&format!(" (expected {})", expected.join(", ")));
        }
        message
    }

    /// Returns a suggestion for fixing the error, if there is a common one.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind {
            ParseErrorKind::UnterminatedQuote => {
                Some("Add a closing quote (') to complete the phrase")
            }
            ParseErrorKind::EmptyFieldName => {
                Some("Put a field name before ':', e.g. 'title:guide'")
            }
            ParseErrorKind::EmptyPhrase => {
                Some("Put at least one word between the quotes, or remove them")
            }
            ParseErrorKind::UnexpectedCharacter => None,
        }
    }

    /// Formats the error with the query and a marker under the error position.
    ///
    /// Tabs and line breaks in the query are echoed as spaces so the marker lines up.
    pub fn format_with_context(&self, input: &str) -> String {
        let column = input
            .get(..self.position)
            .map_or(self.position, |before| before.chars().count());
        let line: String = input
            .chars()
            .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
            .collect();

        let mut result = format!("query syntax error: {}\n", self.message(input));
        result.push_str(&format!("  {line}\n"));
        result.push_str(&format!("  {}^", " ".repeat(column)));
        if let Some(suggestion) = self.suggestion() {
            result.push_str(&format!("\nhint: {suggestion}"));
        }
        result
    }
}

/// Errors that can occur when loading parser options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The options document is not valid TOML or does not match the schema.
    #[error("failed to parse query options: {source}")]
    ParseToml {
        /// Underlying TOML parse error.
        source: de::Error,
    },
}

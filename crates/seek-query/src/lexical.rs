//! Character-class recognizers.
//!
//! These are the leaves of the grammar: each class answers whether a single character
//! belongs to it, and [`scan`] measures the longest run of such characters at an offset.

use std::fmt;

/// The quote character that opens and closes a phrase.
pub const QUOTE: char = '\'';

/// The separator between a field name and its value.
pub const FIELD_SEPARATOR: char = ':';

/// A class of characters recognized by a lexical rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Unicode whitespace.
    Whitespace,
    /// Anything that is not whitespace, a quote, or a field separator.
    TermChar,
    /// Letters, digits and underscore.
    FieldNameChar,
}

impl CharClass {
    /// Returns true if `ch` belongs to this class.
    pub fn contains(self, ch: char) -> bool {
        match self {
            Self::Whitespace => ch.is_whitespace(),
            Self::TermChar => !ch.is_whitespace() && ch != QUOTE && ch != FIELD_SEPARATOR,
            Self::FieldNameChar => ch.is_alphanumeric() || ch == '_',
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Whitespace => "whitespace",
            Self::TermChar => "term character",
            Self::FieldNameChar => "field name character",
        };
        f.write_str(name)
    }
}

/// Returns the byte offset just past the run of `class` characters starting at `start`.
///
/// Returns `start` when the character at `start` is not in the class (or `start` is at
/// the end of `input`).
pub fn scan(class: CharClass, input: &str, start: usize) -> usize {
    let Some(rest) = input.get(start..) else {
        return start;
    };
    let run: usize = rest
        .chars()
        .take_while(|&ch| class.contains(ch))
        .map(char::len_utf8)
        .sum();
    start + run
}

/// Returns true if the character just before `position` is a field name character.
pub fn follows_field_name(input: &str, position: usize) -> bool {
    input
        .get(..position)
        .and_then(|before| before.chars().next_back())
        .is_some_and(|ch| CharClass::FieldNameChar.contains(ch))
}

/// Returns true if a quote appears anywhere after the opening quote at `open`.
pub fn is_closed_quote(input: &str, open: usize) -> bool {
    input
        .get(open + QUOTE.len_utf8()..)
        .is_some_and(|rest| rest.contains(QUOTE))
}

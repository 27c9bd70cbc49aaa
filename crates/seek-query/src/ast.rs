//! Query abstract syntax tree.
//!
//! The semantic result of a parse: an ordered list of terms, phrases and fields. Each node
//! owns its text and carries the byte span it came from in the original query string.

use std::{fmt, slice};

use serde::{Deserialize, Serialize};

use crate::{
    lexical::{FIELD_SEPARATOR, QUOTE},
    span::Span,
};

/// An unquoted word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// The word as written.
    pub text: String,
    /// Where the word appears in the query.
    pub span: Span,
}

/// Quoted text, with its inner whitespace preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    /// The text between the quotes.
    pub text: String,
    /// Where the phrase appears in the query, quotes included.
    pub span: Span,
}

/// The value side of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Value {
    /// A bare word.
    Term(Term),
    /// A quoted phrase.
    Phrase(Phrase),
}

impl Value {
    /// Returns the value's text, without quotes.
    pub fn text(&self) -> &str {
        match self {
            Self::Term(term) => &term.text,
            Self::Phrase(phrase) => &phrase.text,
        }
    }

    /// Returns the value's span.
    pub fn span(&self) -> Span {
        match self {
            Self::Term(term) => term.span,
            Self::Phrase(phrase) => phrase.span,
        }
    }

    /// Formats the value in query syntax.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term(term) => term.text.clone(),
            Self::Phrase(phrase) => format!("{QUOTE}{}{QUOTE}", phrase.text),
        }
    }

    /// Compares kind and text, ignoring spans.
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Term(a), Self::Term(b)) => a.text == b.text,
            (Self::Phrase(a), Self::Phrase(b)) => a.text == b.text,
            _ => false,
        }
    }
}

/// A `name:value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The value to look for in that field.
    pub value: Value,
    /// Where the field appears in the query, from the name to the end of the value.
    pub span: Span,
}

/// One top-level element of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum QueryNode {
    /// A bare word.
    Term(Term),
    /// A quoted phrase.
    Phrase(Phrase),
    /// A field-scoped value.
    Field(Field),
}

impl QueryNode {
    /// Returns the node's span.
    pub fn span(&self) -> Span {
        match self {
            Self::Term(term) => term.span,
            Self::Phrase(phrase) => phrase.span,
            Self::Field(field) => field.span,
        }
    }

    /// Formats the node in query syntax.
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term(term) => term.text.clone(),
            Self::Phrase(phrase) => format!("{QUOTE}{}{QUOTE}", phrase.text),
            Self::Field(field) => format!(
                "{}{FIELD_SEPARATOR}{}",
                field.name,
                field.value.to_query_string()
            ),
        }
    }

    /// Compares kind, names and text, ignoring spans.
    pub fn structurally_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Term(a), Self::Term(b)) => a.text == b.text,
            (Self::Phrase(a), Self::Phrase(b)) => a.text == b.text,
            (Self::Field(a), Self::Field(b)) => {
                a.name == b.name && a.value.structurally_eq(&b.value)
            }
            _ => false,
        }
    }

    /// Formats the node as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(term) => writeln!(f, "{prefix}Term({:?})", term.text),
            Self::Phrase(phrase) => writeln!(f, "{prefix}Phrase({:?})", phrase.text),
            Self::Field(field) => {
                writeln!(f, "{prefix}Field({:?})", field.name)?;
                match &field.value {
                    Value::Term(term) => writeln!(f, "{prefix}  Term({:?})", term.text),
                    Value::Phrase(phrase) => writeln!(f, "{prefix}  Phrase({:?})", phrase.text),
                }
            }
        }
    }
}

impl From<Value> for QueryNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Term(term) => Self::Term(term),
            Value::Phrase(phrase) => Self::Phrase(phrase),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

/// A parsed query: top-level nodes in the order they appear.
///
/// Order is kept because consumers may compose the nodes (for example as an implicit
/// AND) and some compositions care about it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    /// The top-level nodes, left to right.
    pub nodes: Vec<QueryNode>,
}

impl Query {
    /// Creates a query from its nodes.
    pub fn new(nodes: Vec<QueryNode>) -> Self {
        Self { nodes }
    }

    /// Returns the number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the query has no nodes (blank input).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over the top-level nodes.
    pub fn iter(&self) -> impl Iterator<Item = &QueryNode> {
        self.nodes.iter()
    }

    /// Formats the query in query syntax, nodes separated by single spaces.
    ///
    /// Parsing the result yields a structurally equal query.
    pub fn to_query_string(&self) -> String {
        self.nodes
            .iter()
            .map(QueryNode::to_query_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Compares two queries node by node, ignoring spans.
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .nodes
                .iter()
                .zip(&other.nodes)
                .all(|(a, b)| a.structurally_eq(b))
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = &'a QueryNode;
    type IntoIter = slice::Iter<'a, QueryNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query")?;
        for node in &self.nodes {
            node.fmt_tree(f, 1)?;
        }
        Ok(())
    }
}

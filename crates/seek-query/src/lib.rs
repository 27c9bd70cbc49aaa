//! Query parsing and AST for seek search.
//!
//! This crate parses a small search-query language:
//!
//! - **Terms**: `grumble` - bare words
//! - **Phrases**: `'grumble wildly'` - quoted words, inner whitespace kept verbatim
//! - **Fields**: `toggle:knob`, `toggle:'air knob'` - values scoped to a named field
//!
//! Top-level items are separated by whitespace and kept in source order. Parsing is done by
//! a small PEG engine ([`Grammar`]) that builds a concrete [`ParseTree`], which is then
//! projected onto the [`Query`] AST. Failures report the furthest position the grammar
//! reached, classified as a [`ParseErrorKind`].
//!
//! # Example
//!
//! ```
//! use seek_query::{QueryNode, parse};
//!
//! let query = parse("toggle:'air knob' grumble").unwrap();
//! assert_eq!(query.len(), 2);
//! assert!(matches!(query.nodes[0], QueryNode::Field(_)));
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod grammar;
mod lexical;
mod options;
mod parser;
mod project;
mod span;
mod tree;

pub use ast::{Field, Phrase, Query, QueryNode, Term, Value};
pub use error::{OptionsError, ParseError, ParseErrorKind};
pub use grammar::{Expected, Expr, Failure, Grammar, Match, Rule};
pub use lexical::{CharClass, FIELD_SEPARATOR, QUOTE};
pub use options::ParseOptions;
pub use parser::{parse, parse_with};
pub use project::project;
pub use span::Span;
pub use tree::{Node, NodeId, ParseTree, PreorderIter};

//! Query parser.
//!
//! Matches the `query` rule against the whole input, checks the tree for empty phrases,
//! then projects it onto the AST. Blank input is an empty query, not an error.

use crate::{
    ast::Query,
    error::{ParseError, ParseErrorKind},
    grammar::{Grammar, Rule},
    options::ParseOptions,
    project::project,
    tree::{NodeId, ParseTree},
};

/// Parses a query string into an AST with default options.
///
/// Returns an empty [`Query`] for blank input, or a [`ParseError`] for invalid syntax.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    parse_with(input, &ParseOptions::default())
}

/// Parses a query string into an AST.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Query, ParseError> {
    if input.trim().is_empty() {
        return Ok(Query::default());
    }

    let tree = Grammar::get()
        .parse_rule(Rule::Query, input)
        .map_err(|failure| ParseError::from_failure(input, failure))?;

    if !options.allow_empty_phrase
        && let Some(phrase) = first_empty_phrase(&tree)
    {
        return Err(ParseError::new(
            ParseErrorKind::EmptyPhrase,
            tree.span(phrase).start,
        ));
    }

    Ok(project(&tree, options))
}

/// Returns the first `quoted_term` with no `term` inside it.
fn first_empty_phrase(tree: &ParseTree<'_>) -> Option<NodeId> {
    tree.iter_preorder(tree.root())
        .filter(|&id| tree.rule(id) == Some(Rule::QuotedTerm))
        .find(|&id| {
            !tree
                .iter_preorder(id)
                .any(|inner| tree.rule(inner) == Some(Rule::Term))
        })
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::{
        ast::{Field, Phrase, QueryNode, Term, Value},
        span::Span,
    };

    fn term(text: &str, start: usize) -> QueryNode {
        QueryNode::Term(Term {
            text: text.into(),
            span: Span::new(start, start + text.len()),
        })
    }

    fn phrase(text: &str, start: usize) -> QueryNode {
        QueryNode::Phrase(Phrase {
            text: text.into(),
            span: Span::new(start, start + text.len() + 2),
        })
    }

    fn field(name: &str, value: QueryNode, start: usize) -> QueryNode {
        let value = match value {
            QueryNode::Term(term) => Value::Term(term),
            QueryNode::Phrase(phrase) => Value::Phrase(phrase),
            QueryNode::Field(_) => panic!("field values are terms or phrases"),
        };
        QueryNode::Field(Field {
            name: name.into(),
            span: Span::new(start, value.span().end),
            value,
        })
    }

    fn nodes(input: &str) -> Vec<QueryNode> {
        parse(input).unwrap().nodes
    }

    fn error(input: &str) -> ParseError {
        parse(input).unwrap_err()
    }

    #[test]
    fn empty_query() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("   ").unwrap().is_empty());
        assert!(parse("\t\n").unwrap().is_empty());
    }

    #[test]
    fn single_term() {
        assert_eq!(nodes("grumble"), vec![term("grumble", 0)]);
    }

    #[test]
    fn multiple_terms() {
        assert_eq!(
            nodes("rust async await"),
            vec![term("rust", 0), term("async", 5), term("await", 11)]
        );
    }

    #[test]
    fn surrounding_whitespace() {
        assert_eq!(
            nodes("  rust   async  "),
            vec![term("rust", 2), term("async", 9)]
        );
    }

    #[test]
    fn quoted_single_word() {
        assert_eq!(nodes("'grumble'"), vec![phrase("grumble", 0)]);
    }

    #[test]
    fn quoted_words_keep_spacing() {
        assert_eq!(nodes("'grumble wildly'"), vec![phrase("grumble wildly", 0)]);
        assert_eq!(
            nodes("'grumble   wildly'"),
            vec![phrase("grumble   wildly", 0)]
        );
    }

    #[test]
    fn field_with_term() {
        assert_eq!(
            nodes("toggle:knob"),
            vec![field("toggle", term("knob", 7), 0)]
        );
    }

    #[test]
    fn field_with_phrase() {
        assert_eq!(
            nodes("toggle:'air knob'"),
            vec![field("toggle", phrase("air knob", 7), 0)]
        );
    }

    #[test]
    fn order_is_preserved() {
        assert_eq!(
            nodes("a b:c"),
            vec![term("a", 0), field("b", term("c", 4), 2)]
        );
    }

    #[test]
    fn mixed_query() {
        assert_eq!(
            nodes("title:guide 'error handling' rust tags:'a b'"),
            vec![
                field("title", term("guide", 6), 0),
                phrase("error handling", 12),
                term("rust", 29),
                field("tags", phrase("a b", 39), 34),
            ]
        );
    }

    #[test]
    fn terms_allow_punctuation() {
        assert_eq!(nodes("api/handlers"), vec![term("api/handlers", 0)]);
        assert_eq!(nodes("-deprecated"), vec![term("-deprecated", 0)]);
        assert_eq!(nodes("OR"), vec![term("OR", 0)]);
    }

    #[test]
    fn field_value_may_contain_slashes() {
        assert_eq!(
            nodes("path:api/handlers"),
            vec![field("path", term("api/handlers", 5), 0)]
        );
    }

    #[test]
    fn unicode_offsets_are_bytes() {
        assert_eq!(nodes("über alles"), vec![term("über", 0), term("alles", 6)]);
    }

    #[test]
    fn adjacent_phrases_need_whitespace() {
        let err = error("'a''b'");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn error_unterminated_quote() {
        let err = error("'grumble");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 0);
    }

    #[test]
    fn error_unterminated_quote_later() {
        let err = error("rust 'error handling");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 5);
    }

    #[test]
    fn error_unterminated_field_phrase() {
        let err = error("toggle:'air knob");
        assert_eq!(err.kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(err.position, 7);
    }

    #[test]
    fn error_empty_field_name() {
        let err = error(":knob");
        assert_eq!(err.kind, ParseErrorKind::EmptyFieldName);
        assert_eq!(err.position, 0);

        let err = error("rust :knob");
        assert_eq!(err.kind, ParseErrorKind::EmptyFieldName);
        assert_eq!(err.position, 5);
    }

    #[test]
    fn error_field_without_value() {
        let err = error("toggle:");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 7);
    }

    #[test]
    fn error_invalid_field_name() {
        let err = error("a-b:c");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn error_colon_inside_phrase() {
        let err = error("'a:b'");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn error_second_separator() {
        let err = error("a:b:c");
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.position, 3);
    }

    #[test]
    fn error_empty_phrase() {
        let err = error("''");
        assert_eq!(err.kind, ParseErrorKind::EmptyPhrase);
        assert_eq!(err.position, 0);

        let err = error("rust tags:'  '");
        assert_eq!(err.kind, ParseErrorKind::EmptyPhrase);
        assert_eq!(err.position, 10);
    }

    #[test]
    fn empty_phrase_allowed_by_option() {
        let options = ParseOptions {
            allow_empty_phrase: true,
            ..ParseOptions::default()
        };
        let query = parse_with("'' x", &options).unwrap();
        assert_eq!(query.nodes, vec![phrase("", 0), term("x", 3)]);
    }

    #[test]
    fn parse_is_deterministic() {
        let input = "title:guide 'error handling' -deprecated";
        assert_eq!(parse(input), parse(input));
        let bad = "title:guide 'error handling";
        assert_eq!(parse(bad), parse(bad));
    }

    #[test]
    fn performance_many_queries() {
        let queries = [
            "rust",
            "rust async await",
            "'error handling'",
            "title:guide",
            "title:'getting started' rust",
            "tree:docs path:api/handlers",
            "  a   b   c   d   e   f  ",
            "'grumble wildly' toggle:'air knob' toggle:knob",
        ];

        let start = Instant::now();
        for _ in 0..1000 {
            for query in &queries {
                parse(query).unwrap();
            }
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed.as_millis() < 2000,
            "Parsing 8,000 queries took {elapsed:?}, expected < 2s"
        );
    }
}

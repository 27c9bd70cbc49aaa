//! Projection of concrete parse trees onto the query AST.
//!
//! Grouping nodes, quotes, separators and top-level whitespace are dropped; terms, phrases
//! and fields become [`QueryNode`]s in source order. Text comes only from the spans the
//! tree recorded.

use crate::{
    ast::{Field, Phrase, Query, QueryNode, Term, Value},
    grammar::Rule,
    options::ParseOptions,
    tree::{NodeId, ParseTree},
};

/// Projects a parse tree onto a [`Query`].
///
/// Accepts trees rooted at any rule: a `query` tree yields all its items, a `field`,
/// `value`, `quoted_term` or `term` tree yields a single-node query.
pub fn project(tree: &ParseTree<'_>, options: &ParseOptions) -> Query {
    let projector = Projector { tree, options };
    let mut nodes = Vec::new();
    projector.collect(tree.root(), &mut nodes);
    Query::new(nodes)
}

/// Walks a parse tree, emitting AST nodes.
struct Projector<'t, 'i> {
    /// The tree being projected.
    tree: &'t ParseTree<'i>,
    /// Projection options.
    options: &'t ParseOptions,
}

impl Projector<'_, '_> {
    /// Collects the top-level items at or below `id`, in order.
    fn collect(&self, id: NodeId, out: &mut Vec<QueryNode>) {
        match self.tree.rule(id) {
            Some(Rule::Field) => out.extend(self.field(id).map(QueryNode::Field)),
            Some(Rule::Value | Rule::QuotedTerm | Rule::Term) => {
                out.extend(self.value(id).map(QueryNode::from));
            }
            Some(Rule::Space | Rule::Quote | Rule::FieldName) => {}
            Some(Rule::Query) | None => {
                for child in self.tree.children(id) {
                    self.collect(child, out);
                }
            }
        }
    }

    /// Projects a `field` node.
    fn field(&self, id: NodeId) -> Option<Field> {
        let name = self.tree.child_by_rule(id, Rule::FieldName)?;
        let value = self.tree.child_by_rule(id, Rule::Value)?;
        Some(Field {
            name: self.tree.text(name).to_owned(),
            value: self.value(value)?,
            span: self.tree.span(id),
        })
    }

    /// Projects a `value`, `quoted_term` or `term` node.
    fn value(&self, id: NodeId) -> Option<Value> {
        match self.tree.rule(id)? {
            Rule::Value => {
                let inner = self.tree.children(id).next()?;
                self.value(inner)
            }
            Rule::Term => Some(Value::Term(Term {
                text: self.tree.text(id).to_owned(),
                span: self.tree.span(id),
            })),
            Rule::QuotedTerm => Some(Value::Phrase(self.phrase(id))),
            _ => None,
        }
    }

    /// Projects a `quoted_term` node: the leaves between the quotes, joined verbatim.
    fn phrase(&self, id: NodeId) -> Phrase {
        let text: String = self
            .tree
            .children(id)
            .filter(|&child| self.tree.rule(child) != Some(Rule::Quote))
            .flat_map(|child| self.tree.leaves(child))
            .map(|leaf| self.tree.text(leaf))
            .collect();

        let text = if self.options.trim_phrases {
            text.trim().to_owned()
        } else {
            text
        };

        Phrase {
            text,
            span: self.tree.span(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grammar::Grammar, span::Span};

    fn project_rule(rule: Rule, input: &str) -> Query {
        let tree = Grammar::get().parse_rule(rule, input).unwrap();
        project(&tree, &ParseOptions::default())
    }

    #[test]
    fn term_tree() {
        let query = project_rule(Rule::Term, "grumble");
        assert_eq!(
            query.nodes,
            vec![QueryNode::Term(Term {
                text: "grumble".into(),
                span: Span::new(0, 7),
            })]
        );
    }

    #[test]
    fn quoted_term_keeps_inner_whitespace() {
        let query = project_rule(Rule::QuotedTerm, "'grumble \t wildly'");
        assert_eq!(
            query.nodes,
            vec![QueryNode::Phrase(Phrase {
                text: "grumble \t wildly".into(),
                span: Span::new(0, 18),
            })]
        );
    }

    #[test]
    fn field_tree() {
        let query = project_rule(Rule::Field, "toggle:'air knob'");
        let [QueryNode::Field(field)] = query.nodes.as_slice() else {
            panic!("expected a single field, got {query:?}");
        };
        assert_eq!(field.name, "toggle");
        assert_eq!(field.span, Span::new(0, 17));
        assert_eq!(
            field.value,
            Value::Phrase(Phrase {
                text: "air knob".into(),
                span: Span::new(7, 17),
            })
        );
    }

    #[test]
    fn query_skips_whitespace() {
        let query = project_rule(Rule::Query, "  a   b:c  ");
        assert_eq!(query.len(), 2);
        assert_eq!(query.nodes[0].span(), Span::new(2, 3));
        assert_eq!(query.nodes[1].span(), Span::new(6, 9));
    }

    #[test]
    fn trim_phrases_option() {
        let tree = Grammar::get().parse_rule(Rule::Query, "' air knob '").unwrap();
        let options = ParseOptions {
            trim_phrases: true,
            ..ParseOptions::default()
        };
        let query = project(&tree, &options);
        let [QueryNode::Phrase(phrase)] = query.nodes.as_slice() else {
            panic!("expected a single phrase, got {query:?}");
        };
        assert_eq!(phrase.text, "air knob");
        assert_eq!(phrase.span, Span::new(0, 12));
    }
}

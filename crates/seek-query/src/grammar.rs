//! Query grammar and PEG matching engine.
//!
//! # Grammar
//!
//! ```text
//! space       ← [whitespace]+
//! quote       ← "'"
//! field_name  ← [letter digit _]+
//! term        ← [^whitespace ' :]+
//! quoted_term ← quote (term / space)* quote
//! value       ← quoted_term / term
//! field       ← field_name ":" value
//! query       ← space? (field / value) (space (field / value))* space?
//! ```
//!
//! Alternatives are ordered: the first one that matches wins and is never revisited. A
//! failed sequence restores the input position, so repetitions stop cleanly before a
//! partial match. Every expression that matches yields exactly one node in the
//! [`ParseTree`]; a rule labels the node produced by its body with its own name.
//!
//! While matching, the engine remembers the furthest offset at which any terminal failed
//! and what it expected there. That record becomes the [`Failure`] when the match as a
//! whole does not succeed.

use std::{fmt, sync::LazyLock};

use serde::{Deserialize, Serialize};

use crate::{
    lexical::{self, CharClass, FIELD_SEPARATOR, QUOTE},
    span::Span,
    tree::{Node, NodeId, ParseTree},
};

/// The compiled grammar, built on first use and shared read-only afterwards.
static GRAMMAR: LazyLock<Grammar> = LazyLock::new(Grammar::build);

/// A named grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// One or more whitespace characters.
    Space,
    /// A single quote character.
    Quote,
    /// The identifier before a field separator.
    FieldName,
    /// An unquoted word.
    Term,
    /// Quote-delimited terms and whitespace.
    QuotedTerm,
    /// A quoted term or a term.
    Value,
    /// A `name:value` pair.
    Field,
    /// A whole query: fields and values separated by whitespace.
    Query,
}

impl Rule {
    /// Every rule, in definition order.
    pub const ALL: [Self; 8] = [
        Self::Space,
        Self::Quote,
        Self::FieldName,
        Self::Term,
        Self::QuotedTerm,
        Self::Value,
        Self::Field,
        Self::Query,
    ];

    /// Returns the rule's name as written in the grammar.
    pub fn name(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Quote => "quote",
            Self::FieldName => "field_name",
            Self::Term => "term",
            Self::QuotedTerm => "quoted_term",
            Self::Value => "value",
            Self::Field => "field",
            Self::Query => "query",
        }
    }

    /// Returns true for rules that match characters directly rather than other rules.
    pub fn is_lexical(self) -> bool {
        matches!(self, Self::Space | Self::Quote | Self::FieldName | Self::Term)
    }

    /// Position of the rule's definition in the grammar table.
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsing expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// One or more characters of a class.
    Class(CharClass),
    /// Exactly one given character.
    Literal(char),
    /// Another rule, by name.
    Rule(Rule),
    /// Each expression in turn.
    Sequence(Vec<Self>),
    /// The first expression that matches.
    Choice(Vec<Self>),
    /// The expression as many times as it matches, possibly zero.
    ZeroOrMore(Box<Self>),
    /// The expression, or nothing.
    Optional(Box<Self>),
}

/// Returns the body of a rule.
fn definition(rule: Rule) -> Expr {
    use Expr::{Choice, Class, Literal, Optional, Sequence, ZeroOrMore};

    /// `field / value`: one top-level query item.
    fn item() -> Expr {
        Choice(vec![Expr::Rule(Rule::Field), Expr::Rule(Rule::Value)])
    }

    match rule {
        Rule::Space => Class(CharClass::Whitespace),
        Rule::Quote => Sequence(vec![Literal(QUOTE)]),
        Rule::FieldName => Class(CharClass::FieldNameChar),
        Rule::Term => Class(CharClass::TermChar),
        Rule::QuotedTerm => Sequence(vec![
            Expr::Rule(Rule::Quote),
            ZeroOrMore(Box::new(Choice(vec![
                Expr::Rule(Rule::Term),
                Expr::Rule(Rule::Space),
            ]))),
            Expr::Rule(Rule::Quote),
        ]),
        Rule::Value => Choice(vec![Expr::Rule(Rule::QuotedTerm), Expr::Rule(Rule::Term)]),
        Rule::Field => Sequence(vec![
            Expr::Rule(Rule::FieldName),
            Literal(FIELD_SEPARATOR),
            Expr::Rule(Rule::Value),
        ]),
        Rule::Query => Sequence(vec![
            Optional(Box::new(Expr::Rule(Rule::Space))),
            item(),
            ZeroOrMore(Box::new(Sequence(vec![Expr::Rule(Rule::Space), item()]))),
            Optional(Box::new(Expr::Rule(Rule::Space))),
        ]),
    }
}

/// Something the engine tried to match at a failure position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// A lexical rule.
    Rule(Rule),
    /// A literal character outside any lexical rule.
    Literal(char),
    /// The end of the input.
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => write!(f, "{rule}"),
            Self::Literal(ch) => write!(f, "{ch:?}"),
            Self::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// The furthest point a failed match reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Byte offset of the furthest failure.
    pub position: usize,
    /// What was tried at `position`, in the order it was tried.
    pub expected: Vec<Expected>,
    /// Offset of the opening quote of a quoted term that was still open when the
    /// failure at `position` happened.
    pub open_quote: Option<usize>,
}

/// A successful match of a rule against a prefix of the input.
#[derive(Debug, Clone)]
pub struct Match<'i> {
    /// The concrete parse tree.
    pub tree: ParseTree<'i>,
    /// Byte offset just past the matched text.
    pub end: usize,
}

/// The query grammar: one expression per [`Rule`].
#[derive(Debug)]
pub struct Grammar {
    /// Rule bodies indexed by [`Rule::index`].
    rules: Vec<Expr>,
}

impl Grammar {
    /// Returns the shared grammar instance.
    pub fn get() -> &'static Self {
        &GRAMMAR
    }

    /// Builds the rule table.
    fn build() -> Self {
        Self {
            rules: Rule::ALL.into_iter().map(definition).collect(),
        }
    }

    /// Returns the body of a rule.
    pub fn definition(&self, rule: Rule) -> &Expr {
        &self.rules[rule.index()]
    }

    /// Matches `rule` against `input` starting at byte offset `start`.
    ///
    /// The match need not reach the end of the input; [`Match::end`] says where it
    /// stopped.
    pub fn match_rule<'i>(
        &self,
        rule: Rule,
        input: &'i str,
        start: usize,
    ) -> Result<Match<'i>, Failure> {
        let mut matcher = Matcher::new(self, input);
        match matcher.run(rule, start) {
            Some((root, end)) => Ok(Match {
                tree: ParseTree::new(input, matcher.nodes, root),
                end,
            }),
            None => Err(matcher.into_failure(start)),
        }
    }

    /// Matches `rule` against the whole of `input`.
    ///
    /// A match that stops short of the end fails with [`Expected::EndOfInput`] at the stop
    /// position, unless an alternative already failed further along.
    pub fn parse_rule<'i>(&self, rule: Rule, input: &'i str) -> Result<ParseTree<'i>, Failure> {
        let mut matcher = Matcher::new(self, input);
        match matcher.run(rule, 0) {
            Some((root, end)) if end == input.len() => {
                Ok(ParseTree::new(input, matcher.nodes, root))
            }
            Some((_, end)) => {
                matcher.fail(end, Expected::EndOfInput);
                Err(matcher.into_failure(end))
            }
            None => Err(matcher.into_failure(0)),
        }
    }
}

/// State for a single match attempt.
struct Matcher<'g, 'i> {
    /// The grammar being matched.
    grammar: &'g Grammar,
    /// The input text.
    input: &'i str,
    /// Node arena. On failure an expression leaves it as it found it.
    nodes: Vec<Node>,
    /// Rules currently being evaluated, with their start offsets, innermost last.
    active: Vec<(Rule, usize)>,
    /// The furthest failure seen so far.
    furthest: Option<Failure>,
}

impl<'g, 'i> Matcher<'g, 'i> {
    /// Creates a matcher over `input`.
    fn new(grammar: &'g Grammar, input: &'i str) -> Self {
        Self {
            grammar,
            input,
            nodes: Vec::new(),
            active: Vec::new(),
            furthest: None,
        }
    }

    /// Matches `rule` at `start`, returning the root node and end offset.
    fn run(&mut self, rule: Rule, start: usize) -> Option<(NodeId, usize)> {
        if !self.input.is_char_boundary(start) {
            self.fail(start, Expected::Rule(rule));
            return None;
        }
        self.eval_rule(rule, start)
    }

    /// Consumes the matcher, returning the furthest failure.
    fn into_failure(self, position: usize) -> Failure {
        self.furthest.unwrap_or(Failure {
            position,
            expected: Vec::new(),
            open_quote: None,
        })
    }

    /// Evaluates a rule and labels the resulting node with it.
    fn eval_rule(&mut self, rule: Rule, pos: usize) -> Option<(NodeId, usize)> {
        let grammar = self.grammar;
        self.active.push((rule, pos));
        let result = self.eval(grammar.definition(rule), pos);
        self.active.pop();

        let (id, end) = result?;
        let node = &mut self.nodes[id.0];
        if node.rule.is_none() {
            node.rule = Some(rule);
            Some((id, end))
        } else {
            Some(self.push(Some(rule), pos, end, vec![id]))
        }
    }

    /// Evaluates an expression at `pos`.
    fn eval(&mut self, expr: &'g Expr, pos: usize) -> Option<(NodeId, usize)> {
        match expr {
            Expr::Class(class) => {
                let end = lexical::scan(*class, self.input, pos);
                if end == pos {
                    // Classes only occur in lexical rule bodies.
                    if let Some(&(rule, _)) = self.active.last() {
                        self.fail(pos, Expected::Rule(rule));
                    }
                    return None;
                }
                Some(self.push(None, pos, end, Vec::new()))
            }
            Expr::Literal(ch) => {
                let found = self
                    .input
                    .get(pos..)
                    .is_some_and(|rest| rest.starts_with(*ch));
                if !found {
                    let expected = self.expected_literal(*ch);
                    self.fail(pos, expected);
                    return None;
                }
                Some(self.push(None, pos, pos + ch.len_utf8(), Vec::new()))
            }
            Expr::Rule(rule) => self.eval_rule(*rule, pos),
            Expr::Sequence(items) => {
                let mark = self.nodes.len();
                let mut children = Vec::with_capacity(items.len());
                let mut end = pos;
                for item in items {
                    let Some((child, next)) = self.eval(item, end) else {
                        self.nodes.truncate(mark);
                        return None;
                    };
                    children.push(child);
                    end = next;
                }
                Some(self.push(None, pos, end, children))
            }
            Expr::Choice(alternatives) => {
                for alternative in alternatives {
                    if let Some((child, end)) = self.eval(alternative, pos) {
                        return Some(self.push(None, pos, end, vec![child]));
                    }
                }
                None
            }
            Expr::ZeroOrMore(inner) => {
                let mut children = Vec::new();
                let mut end = pos;
                loop {
                    let mark = self.nodes.len();
                    match self.eval(inner, end) {
                        Some((child, next)) if next > end => {
                            children.push(child);
                            end = next;
                        }
                        Some(_) => {
                            // A zero-width iteration would repeat forever.
                            self.nodes.truncate(mark);
                            break;
                        }
                        None => break,
                    }
                }
                Some(self.push(None, pos, end, children))
            }
            Expr::Optional(inner) => match self.eval(inner, pos) {
                Some((child, end)) => Some(self.push(None, pos, end, vec![child])),
                None => Some(self.push(None, pos, pos, Vec::new())),
            },
        }
    }

    /// Appends a node to the arena.
    fn push(
        &mut self,
        rule: Option<Rule>,
        start: usize,
        end: usize,
        children: Vec<NodeId>,
    ) -> (NodeId, usize) {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            rule,
            span: Span::new(start, end),
            children,
        });
        (id, end)
    }

    /// Describes a failed literal by its enclosing lexical rule, if there is one.
    fn expected_literal(&self, ch: char) -> Expected {
        match self.active.last() {
            Some(&(rule, _)) if rule.is_lexical() => Expected::Rule(rule),
            _ => Expected::Literal(ch),
        }
    }

    /// Records a failure at `pos`, keeping only the furthest position.
    fn fail(&mut self, pos: usize, expected: Expected) {
        let open_quote = self
            .active
            .iter()
            .rev()
            .find(|(rule, _)| *rule == Rule::QuotedTerm)
            .map(|&(_, start)| start)
            .filter(|&start| start < pos);

        if let Some(furthest) = &mut self.furthest
            && furthest.position >= pos
        {
            if furthest.position == pos {
                if !furthest.expected.contains(&expected) {
                    furthest.expected.push(expected);
                }
                if furthest.open_quote.is_none() {
                    furthest.open_quote = open_quote;
                }
            }
            return;
        }

        self.furthest = Some(Failure {
            position: pos,
            expected: vec![expected],
            open_quote,
        });
    }
}

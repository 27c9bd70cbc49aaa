//! Concrete parse trees.
//!
//! The grammar engine records one node per expression it matches. Nodes live in a flat
//! arena owned by the [`ParseTree`] and refer to their children by [`NodeId`], so the tree
//! has no ownership cycles and slicing a node's text is a span lookup into the input.
//!
//! Children are always pushed before their parent, which means the arena is in post-order
//! and the root is the last node.

use std::fmt;

use crate::{grammar::Rule, span::Span};

/// Index of a node within its [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// A single match recorded by the grammar engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The rule that produced this node, or `None` for anonymous grouping nodes
    /// (literals, sequences, choices, repetitions and optionals).
    pub rule: Option<Rule>,
    /// The input range this node matched.
    pub span: Span,
    /// Child nodes in match order.
    pub children: Vec<NodeId>,
}

impl Node {
    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A concrete parse tree over a borrowed input string.
#[derive(Debug, Clone)]
pub struct ParseTree<'i> {
    /// The text that was matched.
    input: &'i str,
    /// Node arena, in post-order.
    nodes: Vec<Node>,
    /// The node for the top-level rule.
    root: NodeId,
}

impl<'i> ParseTree<'i> {
    /// Creates a tree from an arena whose root is `root`.
    pub(crate) fn new(input: &'i str, nodes: Vec<Node>, root: NodeId) -> Self {
        Self { input, nodes, root }
    }

    /// Returns the matched input.
    pub fn input(&self) -> &'i str {
        self.input
    }

    /// Returns the root node's id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the rule that labeled a node, if any.
    pub fn rule(&self, id: NodeId) -> Option<Rule> {
        self.node(id).rule
    }

    /// Returns the span of a node.
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// Returns the input text matched by a node.
    pub fn text(&self, id: NodeId) -> &'i str {
        self.node(id).span.slice(self.input)
    }

    /// Returns the ids of a node's children in match order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// Returns the first child of `id` labeled with `rule`.
    pub fn child_by_rule(&self, id: NodeId, rule: Rule) -> Option<NodeId> {
        self.children(id).find(|&child| self.rule(child) == Some(rule))
    }

    /// Returns the total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes. A tree built by the engine never is.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over `id` and its descendants in pre-order.
    pub fn iter_preorder(&self, id: NodeId) -> PreorderIter<'_, 'i> {
        PreorderIter {
            tree: self,
            stack: vec![id],
        }
    }

    /// Returns an iterator over the leaves below `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.iter_preorder(id).filter(|&node| self.node(node).is_leaf())
    }

    /// Formats the subtree rooted at `id`, one node per line.
    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        let node = self.node(id);
        let name = node.rule.map_or("<anon>", Rule::name);
        writeln!(
            f,
            "{}{name} {}..{} {:?}",
            "  ".repeat(indent),
            node.span.start,
            node.span.end,
            self.text(id)
        )?;
        for child in &node.children {
            self.fmt_node(f, *child, indent + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ParseTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root, 0)
    }
}

/// Pre-order (depth-first, left to right) iterator over node ids.
pub struct PreorderIter<'t, 'i> {
    /// The tree being walked.
    tree: &'t ParseTree<'i>,
    /// Nodes still to visit, next on top.
    stack: Vec<NodeId>,
}

impl Iterator for PreorderIter<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}

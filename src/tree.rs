//! Index-arena tree used for derivation trees and ASTs.
//!
//! Nodes live in one `Vec` and refer to their children by `NodeId`, so trees
//! own their values outright and never hold references back into a grammar.
//! A tree with no nodes at all is the "empty tree", the marker a generator
//! returns when it gave up on its size limit.

use crate::grammar::{Symbol, Terminal};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node<V> {
    value: Option<V>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V> Tree<V> {
    /// The empty tree: no root, no nodes.
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// A single-node tree holding `value`.
    pub fn new(value: V) -> Self {
        Self {
            nodes: vec![Node {
                value: Some(value),
                children: Vec::new(),
            }],
        }
    }

    /// A single-node tree whose root has no value yet.
    pub fn unoccupied() -> Self {
        Self {
            nodes: vec![Node {
                value: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.nodes.get(id.0).and_then(|n| n.value.as_ref())
    }

    pub fn set_value(&mut self, id: NodeId, value: V) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.value = Some(value);
        }
    }

    pub fn is_occupied(&self, id: NodeId) -> bool {
        self.value(id).is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// Appends a new last child to `parent` and returns its id.
    pub fn attach(&mut self, parent: NodeId, value: Option<V>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            value,
            children: Vec::new(),
        });
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.push(id);
        }
        id
    }

    /// Node ids in depth-first pre-order, parents before children and
    /// siblings left to right.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    /// Leaves from left to right.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    /// Number of levels; 0 for the empty tree.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root() else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 1)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(self.children(id).iter().map(|&c| (c, level + 1)));
        }
        deepest
    }
}

impl<T> Tree<Symbol<T>> {
    /// The terminals at the leaves, left to right: the sentence this
    /// derivation tree derives.
    pub fn terminals(&self) -> Vec<&Terminal<T>> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.value(id).and_then(Symbol::as_terminal))
            .collect()
    }
}

enum Render {
    Node(NodeId),
    Space,
    Close,
}

/// Renders nested as `value(child child ...)`; unoccupied nodes print as `_`.
/// Walks with an explicit stack, so tree depth is bounded by memory only.
impl<V: fmt::Display> fmt::Display for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack: Vec<Render> = self.root().map(Render::Node).into_iter().collect();
        while let Some(step) = stack.pop() {
            match step {
                Render::Space => f.write_str(" ")?,
                Render::Close => f.write_str(")")?,
                Render::Node(id) => {
                    match self.value(id) {
                        Some(value) => write!(f, "{}", value)?,
                        None => f.write_str("_")?,
                    }
                    let children = self.children(id);
                    if !children.is_empty() {
                        f.write_str("(")?;
                        stack.push(Render::Close);
                        for (i, &child) in children.iter().enumerate().rev() {
                            stack.push(Render::Node(child));
                            if i > 0 {
                                stack.push(Render::Space);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree<&'static str> {
        let mut tree = Tree::new("a");
        let root = tree.root().unwrap();
        let b = tree.attach(root, Some("b"));
        tree.attach(b, Some("d"));
        tree.attach(b, Some("e"));
        tree.attach(root, Some("c"));
        tree
    }

    #[test]
    fn test_empty_tree() {
        let tree: Tree<u8> = Tree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.depth(), 0);
        assert!(tree.preorder().is_empty());
        assert_eq!(tree.to_string(), "");
    }

    #[test]
    fn test_preorder_and_leaves() {
        let tree = sample();
        let order: Vec<&str> = tree
            .preorder()
            .into_iter()
            .map(|id| *tree.value(id).unwrap())
            .collect();
        assert_eq!(order, vec!["a", "b", "d", "e", "c"]);

        let leaves: Vec<&str> = tree
            .leaves()
            .into_iter()
            .map(|id| *tree.value(id).unwrap())
            .collect();
        assert_eq!(leaves, vec!["d", "e", "c"]);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "a(b(d e) c)");

        let mut tree: Tree<&str> = Tree::unoccupied();
        let root = tree.root().unwrap();
        assert!(!tree.is_occupied(root));
        tree.attach(root, Some("x"));
        assert_eq!(tree.to_string(), "_(x)");
        tree.set_value(root, "r");
        assert_eq!(tree.to_string(), "r(x)");
    }

    #[test]
    fn test_display_deep_chain() {
        const DEPTH: usize = 200_000;
        let mut tree = Tree::new(0u8);
        let mut parent = tree.root().unwrap();
        for _ in 1..DEPTH {
            parent = tree.attach(parent, Some(0));
        }
        tree.attach(parent, None);

        let rendered = tree.to_string();
        assert_eq!(tree.depth(), DEPTH + 1);
        assert!(rendered.starts_with("0(0(0("));
        assert!(rendered.ends_with("0(_))))"));
        assert_eq!(rendered.len(), DEPTH * 3 + 1);
    }
}

//! Arena-backed syntax tree for GDL clauses
//!
//! Nodes live in a flat `Vec` and refer to each other by index, so parent
//! back-references stay valid without any shared ownership. The root node
//! owns the top-level clauses of a program; a `Rule` node's first child is
//! its head and the remaining children are its body literals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node within its [`GdlTree`] arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Get the raw index value (for debugging/serialization)
    pub fn index(self) -> usize {
        self.0
    }
}

/// Syntactic category of a node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The synthetic program root; its children are the top-level clauses.
    Root,
    /// A `(<= head body...)` clause.
    Rule,
    /// A compound term or relation application.
    Formula,
    /// A `?`-prefixed variable. The atom carries a clause-scope suffix so
    /// that identical source names in different clauses never alias.
    Variable,
    /// A bare symbol.
    Constant,
}

/// One node of the tree: a kind, its atom, and index links to its
/// neighbourhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub atom: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A whole program (or fragment) as an arena of [`Node`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GdlTree {
    nodes: Vec<Node>,
}

impl GdlTree {
    /// Create an empty tree containing only the root node.
    pub fn new() -> Self {
        GdlTree {
            nodes: vec![Node {
                kind: NodeKind::Root,
                atom: String::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new node under `parent` and return its id.
    pub fn push(&mut self, kind: NodeKind, atom: &str, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            atom: atom.to_string(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// 1-based position of `id` among its siblings, or 0 for the root.
    ///
    /// For an argument of a formula this is exactly the argument position
    /// used by domain lookups.
    pub fn position(&self, id: NodeId) -> usize {
        match self.nodes[id.0].parent {
            None => 0,
            Some(p) => {
                self.nodes[p.0]
                    .children
                    .iter()
                    .position(|&c| c == id)
                    .map(|i| i + 1)
                    .unwrap_or(0)
            }
        }
    }

    /// The top-level clauses of the program.
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[0].children
    }

    /// Canonical rendering of the subtree at `id`.
    ///
    /// Constants and variables render as their atom; rules and formulas as
    /// a parenthesized list with single-space separation. For ground terms
    /// this rendering is injective, which is what makes rendered strings
    /// usable as table keys downstream.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match node.kind {
            NodeKind::Root => {
                for (i, &child) in node.children.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    self.render_into(child, out);
                }
            }
            NodeKind::Constant | NodeKind::Variable => out.push_str(&node.atom),
            NodeKind::Rule | NodeKind::Formula => {
                out.push('(');
                out.push_str(&node.atom);
                for &child in &node.children {
                    out.push(' ');
                    self.render_into(child, out);
                }
                out.push(')');
            }
        }
    }

    /// Render every top-level clause on its own line.
    pub fn render_program(&self) -> Vec<String> {
        self.top_level().iter().map(|&c| self.render(c)).collect()
    }

    /// All `Variable` nodes in the subtree at `id`, in pre-order.
    pub fn variables_in(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_variables(id, &mut out);
        out
    }

    fn collect_variables(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id.0];
        if node.kind == NodeKind::Variable {
            out.push(id);
        }
        for &child in &node.children {
            self.collect_variables(child, out);
        }
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl fmt::Display for GdlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(self.root()))
    }
}

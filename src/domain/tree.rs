//! Tree node shared by the crawler, the navigator and the favourites store.

use std::fmt;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use termtree::Tree;

/// Depth of a Repo below the Root.
pub const REPO_DEPTH: usize = 3;

/// Position of a node in the awesome hierarchy, derived from its depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Category,
    Subcategory,
    Repo,
}

impl NodeKind {
    /// Kind of a node at `depth` below the Root (Root is depth 0).
    ///
    /// Anything deeper than a Repo is still reported as a Repo.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => NodeKind::Root,
            1 => NodeKind::Category,
            2 => NodeKind::Subcategory,
            _ => NodeKind::Repo,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "root",
            NodeKind::Category => "category",
            NodeKind::Subcategory => "subcategory",
            NodeKind::Repo => "repo",
        };
        write!(f, "{}", name)
    }
}

/// One element of the Category → Subcategory → Repo hierarchy.
///
/// Children keep discovery order and are unique by name. The only mutation
/// is appending a child that is not present yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Display label, unique among siblings
    pub name: String,
    /// Link of the node; authoritative at Repo depth
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Ordered children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            children: Vec::new(),
        }
    }

    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child labels in display order.
    pub fn child_names(&self) -> Vec<String> {
        self.children.iter().map(|c| c.name.clone()).collect()
    }

    pub fn child(&self, label: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == label)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.children.iter().position(|c| c.name == label)
    }

    pub(crate) fn child_at(&self, idx: usize) -> Option<&TreeNode> {
        self.children.get(idx)
    }

    /// Node reached by following child `indices` from here.
    pub(crate) fn descend_mut(&mut self, indices: &[usize]) -> Option<&mut TreeNode> {
        match indices.split_first() {
            None => Some(self),
            Some((&first, rest)) => self.children.get_mut(first)?.descend_mut(rest),
        }
    }

    /// Returns the child named `label`, creating an empty one if absent.
    pub fn add(&mut self, label: &str) -> &mut TreeNode {
        self.add_node(TreeNode::new(label))
    }

    /// Appends `node` unless a sibling with the same name exists.
    ///
    /// Returns the node that ends up in the tree, which is the existing
    /// sibling when there was one; `node` is dropped in that case.
    pub fn add_node(&mut self, node: TreeNode) -> &mut TreeNode {
        let idx = match self.position(&node.name) {
            Some(idx) => idx,
            None => {
                self.children.push(node);
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }

    /// Uniform random pick among the children, `None` when there are none.
    pub fn random(&self) -> Option<&TreeNode> {
        self.children.choose(&mut rand::thread_rng())
    }

    /// Number of levels in this subtree, counting this node.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes below this one.
    pub fn count(&self) -> usize {
        self.iter().count() - 1
    }

    /// Leaf nodes in pre-order.
    pub fn leaves(&self) -> Vec<&TreeNode> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node)
            .collect()
    }

    /// Pre-order traversal yielding `(depth, node)`, this node at depth 0.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            stack: vec![(0, self)],
        }
    }

    /// Display form for terminal output.
    pub fn to_termtree(&self) -> Tree<String> {
        let leaves: Vec<_> = self.children.iter().map(TreeNode::to_termtree).collect();
        Tree::new(self.name.clone()).with_leaves(leaves)
    }

    /// Display form limited to `max_depth` levels below this node.
    pub fn to_termtree_limited(&self, max_depth: usize) -> Tree<String> {
        if max_depth == 0 {
            let label = if self.children.is_empty() {
                self.name.clone()
            } else {
                format!("{} ({})", self.name, self.children.len())
            };
            return Tree::new(label);
        }
        let leaves: Vec<_> = self
            .children
            .iter()
            .map(|c| c.to_termtree_limited(max_depth - 1))
            .collect();
        Tree::new(self.name.clone()).with_leaves(leaves)
    }
}

pub struct TreeIter<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

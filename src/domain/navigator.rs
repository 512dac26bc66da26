//! Cursor-based navigation through a materialized awesome tree.

use tracing::{debug, instrument};

use crate::domain::error::NavigationError;
use crate::domain::tree::{NodeKind, TreeNode, REPO_DEPTH};

/// Position inside a [`Navigator`] tree.
///
/// A cursor is the list of child indices from the Root. Nodes are never
/// removed or reordered, so a cursor stays valid for the navigator that
/// produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    indices: Vec<usize>,
}

impl Cursor {
    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_depth(self.depth())
    }

    pub fn is_root(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Owns the browsed tree and resolves cursors against it.
#[derive(Debug, Clone)]
pub struct Navigator {
    root: TreeNode,
}

impl Navigator {
    pub fn new(root: TreeNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Cursor at the Root.
    pub fn start(&self) -> Cursor {
        Cursor::default()
    }

    /// Node under `cursor`.
    ///
    /// Cursors are only valid with the navigator that produced them; a
    /// foreign cursor panics in debug builds and resolves to its deepest
    /// existing ancestor otherwise.
    pub fn node(&self, cursor: &Cursor) -> &TreeNode {
        let mut node = &self.root;
        for &idx in &cursor.indices {
            match node.child_at(idx) {
                Some(child) => node = child,
                None => {
                    debug_assert!(false, "cursor index {idx} out of range under '{}'", node.name);
                    break;
                }
            }
        }
        node
    }

    pub fn kind(&self, cursor: &Cursor) -> NodeKind {
        cursor.kind()
    }

    /// Labels offered at `cursor`, in display order.
    pub fn choices(&self, cursor: &Cursor) -> Vec<String> {
        self.node(cursor).child_names()
    }

    /// Move from `cursor` to its child named `label`.
    ///
    /// The caller keeps its cursor when this fails.
    #[instrument(level = "debug", skip(self, cursor), fields(depth = cursor.depth()))]
    pub fn select_child(&self, cursor: &Cursor, label: &str) -> Result<Cursor, NavigationError> {
        let node = self.node(cursor);
        let idx = node.position(label).ok_or_else(|| NavigationError::NotFound {
            label: label.to_string(),
            path: self.current_path(cursor),
        })?;

        let mut indices = cursor.indices.clone();
        indices.push(idx);
        debug!("selected '{}' at index {}", label, idx);
        Ok(Cursor { indices })
    }

    /// Labels from the Root (exclusive) to `cursor`.
    pub fn current_path(&self, cursor: &Cursor) -> Vec<String> {
        let mut path = Vec::with_capacity(cursor.depth());
        let mut node = &self.root;
        for &idx in &cursor.indices {
            match node.child_at(idx) {
                Some(child) => {
                    path.push(child.name.clone());
                    node = child;
                }
                None => {
                    debug_assert!(false, "cursor index {idx} out of range under '{}'", node.name);
                    break;
                }
            }
        }
        path
    }

    /// URL of the Repo under `cursor`.
    pub fn current_url(&self, cursor: &Cursor) -> Result<&str, NavigationError> {
        if cursor.depth() != REPO_DEPTH {
            return Err(NavigationError::NotARepo {
                path: self.current_path(cursor),
            });
        }
        Ok(self.node(cursor).url())
    }

    /// True for a Subcategory whose repos have not been loaded yet.
    pub fn needs_expansion(&self, cursor: &Cursor) -> bool {
        cursor.kind() == NodeKind::Subcategory && self.node(cursor).is_leaf()
    }

    /// Append `repos` under the Subcategory at `cursor`.
    ///
    /// Existing children with the same names are kept as they are.
    #[instrument(level = "debug", skip(self, cursor, repos), fields(count = repos.len()))]
    pub fn expand(&mut self, cursor: &Cursor, repos: Vec<TreeNode>) -> Result<(), NavigationError> {
        let path = self.current_path(cursor);
        if cursor.kind() != NodeKind::Subcategory {
            return Err(NavigationError::NotExpandable { path });
        }
        let node = self
            .root
            .descend_mut(&cursor.indices)
            .ok_or(NavigationError::NotExpandable { path })?;
        for repo in repos {
            node.add_node(repo);
        }
        Ok(())
    }
}

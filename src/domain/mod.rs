//! Domain layer: the awesome tree, list documents and navigation
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod document;
pub mod error;
pub mod navigator;
pub mod tree;

pub use document::{document_urls_for, parse_entries, parse_repos, parse_seed, LinkKind, ListEntry};
pub use error::{DomainError, NavigationError};
pub use navigator::{Cursor, Navigator};
pub use tree::{NodeKind, TreeNode, REPO_DEPTH};

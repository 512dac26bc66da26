//! Favourites store
//!
//! A secondary tree of past choices: categories at depth 1, subcategories at
//! depth 2. Repos are never stored. Persisted as one JSON blob per key.

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::TreeNode;
use crate::infrastructure::traits::CacheStore;

/// Cache key of the favourites tree.
pub const FAVOURITES_KEY: &str = "awesome";

/// The user's recorded categories and subcategories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavouriteStore {
    key: String,
    tree: TreeNode,
}

impl FavouriteStore {
    /// Empty store whose root is named after `key`.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            tree: TreeNode::new(key),
        }
    }

    /// Load the store from `cache`.
    ///
    /// Missing, unreadable or corrupt data yields an empty store; this never
    /// fails.
    #[instrument(level = "debug", skip(cache))]
    pub fn from_cache(cache: &dyn CacheStore, key: &str) -> Self {
        let blob = match cache.read(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("no favourites under '{}'", key);
                return Self::new(key);
            }
            Err(e) => {
                warn!("cannot read favourites '{}': {}", key, e);
                return Self::new(key);
            }
        };

        match serde_json::from_str::<TreeNode>(&blob) {
            Ok(mut tree) => {
                tree.name = key.to_string();
                Self {
                    key: key.to_string(),
                    tree,
                }
            }
            Err(e) => {
                warn!("ignoring corrupt favourites at {}: {}", cache.location(key), e);
                Self::new(key)
            }
        }
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_leaf()
    }

    /// Record a category choice and, when given, a subcategory below it.
    pub fn record(&mut self, category: &str, subcategory: Option<&str>) {
        let node = self.tree.add(category);
        if let Some(sub) = subcategory {
            node.add(sub);
        }
        debug!("recorded favourite {} / {:?}", category, subcategory);
    }

    /// Write the whole tree under the store's key, replacing the blob.
    #[instrument(level = "debug", skip(self, cache), fields(key = %self.key))]
    pub fn save(&self, cache: &dyn CacheStore) -> ApplicationResult<()> {
        let blob = serde_json::to_string(&self.tree).map_err(|e| ApplicationError::Cache {
            key: self.key.clone(),
            message: format!("serialize: {e}"),
        })?;
        cache.write(&self.key, &blob).with_key_context("write", &self.key)
    }
}

//! Browse flows: interactive walk, random pick, surprise, cache
//!
//! A walk always ends on a Repo. Subcategories that were not crawled into the
//! cached tree are expanded on demand through the crawler.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::services::crawler::{CrawlEvent, CrawlOutcome, Crawler};
use crate::application::services::favourites::{FavouriteStore, FAVOURITES_KEY};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{Cursor, Navigator, NodeKind, TreeNode, REPO_DEPTH};
use crate::infrastructure::traits::{CacheStore, SelectionItem, Selector};

/// Cache key of the crawled tree.
pub const TREE_CACHE_KEY: &str = "tree";

/// A Repo reached by one of the browse flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// Category, Subcategory and Repo labels
    pub path: Vec<String>,
    pub url: String,
}

/// Orchestrates the browse flows over the crawler and the cache.
pub struct BrowseService {
    crawler: Arc<Crawler>,
    cache: Arc<dyn CacheStore>,
}

impl BrowseService {
    pub fn new(crawler: Arc<Crawler>, cache: Arc<dyn CacheStore>) -> Self {
        Self { crawler, cache }
    }

    // ============================================================
    // Tree and favourites
    // ============================================================

    /// The tree stored by the last `cache` run, if it is usable.
    pub fn cached_tree(&self) -> Option<TreeNode> {
        let blob = match self.cache.read(TREE_CACHE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                warn!("cannot read cached tree: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<TreeNode>(&blob) {
            Ok(tree) if !tree.is_leaf() => Some(tree),
            Ok(_) => None,
            Err(e) => {
                warn!(
                    "ignoring corrupt tree at {}: {}",
                    self.cache.location(TREE_CACHE_KEY),
                    e
                );
                None
            }
        }
    }

    /// Navigator over the cached tree, or over a shallow tree built from the
    /// seeds when nothing was cached.
    #[instrument(level = "debug", skip(self))]
    pub fn load_navigator(&self) -> ApplicationResult<Navigator> {
        if let Some(tree) = self.cached_tree() {
            debug!("using cached tree with {} nodes", tree.count());
            return Ok(Navigator::new(tree));
        }

        info!("no cached tree, reading seeds");
        let (tree, mut errors) = self.crawler.fetch_shallow_tree();
        if tree.is_leaf() {
            if !errors.is_empty() {
                return Err(errors.swap_remove(0).into());
            }
            return Err(ApplicationError::NothingToPick {
                path: tree.name.clone(),
            });
        }
        Ok(Navigator::new(tree))
    }

    pub fn favourites(&self) -> FavouriteStore {
        FavouriteStore::from_cache(self.cache.as_ref(), FAVOURITES_KEY)
    }

    pub fn save_favourites(&self, favourites: &FavouriteStore) -> ApplicationResult<()> {
        favourites.save(self.cache.as_ref())
    }

    /// Drop the stored favourites.
    pub fn reset(&self) -> ApplicationResult<()> {
        self.cache
            .remove(FAVOURITES_KEY)
            .with_key_context("remove", FAVOURITES_KEY)
    }

    // ============================================================
    // Flows
    // ============================================================

    /// Walk Root → Category → Subcategory → Repo with `selector`.
    ///
    /// The chosen category and subcategory are recorded in `favourites`.
    /// Returns `None` when the user cancels a prompt.
    #[instrument(level = "debug", skip_all)]
    pub fn walk(
        &self,
        nav: &mut Navigator,
        selector: &dyn Selector,
        favourites: &mut FavouriteStore,
    ) -> ApplicationResult<Option<Pick>> {
        let mut cursor = nav.start();

        while cursor.depth() < REPO_DEPTH {
            self.ensure_expanded(nav, &cursor)?;
            let node = nav.node(&cursor);
            let items: Vec<SelectionItem> = node
                .children()
                .iter()
                .map(|c| SelectionItem::labelled(&c.name))
                .collect();
            if items.is_empty() {
                return Err(nothing_to_pick(nav, &cursor));
            }

            let prompt = format!("{}> ", node.name);
            let selected = selector
                .select_one(&items, &prompt)
                .map_err(|message| ApplicationError::Selection { message })?;
            let Some(item) = selected else {
                debug!("walk cancelled at depth {}", cursor.depth());
                return Ok(None);
            };

            cursor = nav.select_child(&cursor, &item.value)?;
            let path = nav.current_path(&cursor);
            match nav.kind(&cursor) {
                NodeKind::Category => favourites.record(&path[0], None),
                NodeKind::Subcategory => favourites.record(&path[0], Some(&path[1])),
                _ => {}
            }
        }

        pick(nav, &cursor).map(Some)
    }

    /// Uniformly random descent from the Root to a Repo.
    #[instrument(level = "debug", skip_all)]
    pub fn random(&self, nav: &mut Navigator) -> ApplicationResult<Pick> {
        let start = nav.start();
        self.random_from(nav, start)
    }

    /// Random Repo below a random favourite; a plain random pick when there
    /// are no favourites.
    #[instrument(level = "debug", skip_all)]
    pub fn surprise(
        &self,
        nav: &mut Navigator,
        favourites: &FavouriteStore,
    ) -> ApplicationResult<Pick> {
        let Some(category) = favourites.tree().random() else {
            debug!("no favourites, falling back to random");
            return self.random(nav);
        };
        let subcategory = category.random();

        let cursor = select_or_random(nav, &nav.start(), Some(&category.name))?;
        let cursor = select_or_random(nav, &cursor, subcategory.map(|s| s.name.as_str()))?;
        self.random_from(nav, cursor)
    }

    /// Crawl everything and store the tree for later runs.
    #[instrument(level = "info", skip_all)]
    pub fn cache(&self, sink: Sender<CrawlEvent>) -> ApplicationResult<CrawlOutcome> {
        let outcome = self.crawler.fetch_all_repos(sink)?;
        if outcome.tree.is_leaf() {
            warn!("crawl produced an empty tree, keeping the previous cache");
            return Ok(outcome);
        }

        let blob = serde_json::to_string(&outcome.tree).map_err(|e| ApplicationError::Cache {
            key: TREE_CACHE_KEY.to_string(),
            message: format!("serialize: {e}"),
        })?;
        self.cache
            .write(TREE_CACHE_KEY, &blob)
            .with_key_context("write", TREE_CACHE_KEY)?;
        info!("stored {} nodes at {}", outcome.tree.count(), self.cache.location(TREE_CACHE_KEY));
        Ok(outcome)
    }

    // ============================================================
    // Helpers
    // ============================================================

    /// Fetch the repos of an unexpanded Subcategory under `cursor`.
    fn ensure_expanded(&self, nav: &mut Navigator, cursor: &Cursor) -> ApplicationResult<()> {
        if !nav.needs_expansion(cursor) {
            return Ok(());
        }
        let link = nav.node(cursor).url.clone();
        debug!("expanding {:?} from {}", nav.current_path(cursor), link);
        let repos = self.crawler.fetch_repos(&link)?;
        nav.expand(cursor, repos)?;
        Ok(())
    }

    fn random_from(&self, nav: &mut Navigator, mut cursor: Cursor) -> ApplicationResult<Pick> {
        while cursor.depth() < REPO_DEPTH {
            self.ensure_expanded(nav, &cursor)?;
            let label = match nav.node(&cursor).random() {
                Some(child) => child.name.clone(),
                None => return Err(nothing_to_pick(nav, &cursor)),
            };
            cursor = nav.select_child(&cursor, &label)?;
        }
        pick(nav, &cursor)
    }
}

/// Move to the child named `label`, or to a random child when the label is
/// missing from the tree.
fn select_or_random(
    nav: &Navigator,
    cursor: &Cursor,
    label: Option<&str>,
) -> ApplicationResult<Cursor> {
    if let Some(label) = label {
        match nav.select_child(cursor, label) {
            Ok(next) => return Ok(next),
            Err(e) => warn!("favourite no longer listed, picking another: {}", e),
        }
    }
    let fallback = match nav.node(cursor).random() {
        Some(child) => child.name.clone(),
        None => return Err(nothing_to_pick(nav, cursor)),
    };
    Ok(nav.select_child(cursor, &fallback)?)
}

fn pick(nav: &Navigator, cursor: &Cursor) -> ApplicationResult<Pick> {
    Ok(Pick {
        path: nav.current_path(cursor),
        url: nav.current_url(cursor)?.to_string(),
    })
}

fn nothing_to_pick(nav: &Navigator, cursor: &Cursor) -> ApplicationError {
    let path = nav.current_path(cursor);
    ApplicationError::NothingToPick {
        path: if path.is_empty() {
            nav.root().name.clone()
        } else {
            path.join(" / ")
        },
    }
}

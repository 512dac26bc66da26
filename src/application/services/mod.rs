//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (DocumentFetcher, CacheStore, Selector)
//! but are themselves concrete structs, not traits.

pub mod browse;
pub mod crawler;
pub mod favourites;

pub use browse::{BrowseService, Pick, TREE_CACHE_KEY};
pub use crawler::{CrawlEvent, CrawlOutcome, CrawlSummary, Crawler, Progress, ROOT_NAME};
pub use favourites::{FavouriteStore, FAVOURITES_KEY};

//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{BrowseService, Crawler};
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::traits::{
    Browser, CacheStore, CommandRunner, DocumentFetcher, FileCacheStore, HttpFetcher,
    RealCommandRunner, Selector, SkimSelector, SystemBrowser,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Document transport
    pub fetcher: Arc<dyn DocumentFetcher>,

    /// Favourites and tree cache
    pub cache: Arc<dyn CacheStore>,

    /// Interactive picker
    pub selector: Arc<dyn Selector>,

    /// Repo opener
    pub browser: Arc<dyn Browser>,

    pub crawler: Arc<Crawler>,
    pub browse: BrowseService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fetcher = HttpFetcher::new(
            &settings.user_agent,
            settings.timeout_secs.map(Duration::from_secs),
            settings.max_retries,
        )?;
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let browser = SystemBrowser::new(settings.browser.clone(), cmd);
        let cache = FileCacheStore::new(settings.cache_dir.clone());

        Ok(Self::with_deps(
            settings,
            Arc::new(fetcher),
            Arc::new(cache),
            Arc::new(SkimSelector),
            Arc::new(browser),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fetcher: Arc<dyn DocumentFetcher>,
        cache: Arc<dyn CacheStore>,
        selector: Arc<dyn Selector>,
        browser: Arc<dyn Browser>,
    ) -> Self {
        let settings = Arc::new(settings);
        let crawler = Arc::new(Crawler::new(
            fetcher.clone(),
            settings.seeds.clone(),
            settings.workers,
        ));
        let browse = BrowseService::new(crawler.clone(), cache.clone());

        Self {
            settings,
            fetcher,
            cache,
            selector,
            browser,
            crawler,
            browse,
        }
    }
}

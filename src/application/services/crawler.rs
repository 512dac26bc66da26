//! Crawler service
//!
//! Builds the Category → Subcategory → Repo tree from the seed list documents.
//! Subcategory documents are fetched on a fixed-size worker pool; every
//! failure is recorded and its subtree left out, the crawl itself never aborts.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, CrawlError};
use crate::config::MAX_WORKERS;
use crate::domain::{document_urls_for, parse_repos, parse_seed, DomainError, TreeNode};
use crate::infrastructure::traits::DocumentFetcher;

/// Name of the Root node of every crawled tree.
pub const ROOT_NAME: &str = "awesome";

/// Cumulative crawl counters.
///
/// One event is sent per finished list document fetch. Within a crawl every
/// field is non-decreasing from one event to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub discovered: usize,
    pub crawled: usize,
    pub failed: usize,
}

/// Totals of a finished crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub discovered: usize,
    pub crawled: usize,
    pub errors: usize,
}

/// Events on the crawl progress stream; `Done` is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    Progress(Progress),
    Done(CrawlSummary),
}

/// Result of a complete crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub tree: TreeNode,
    pub summary: CrawlSummary,
    /// Failures in discovery order: seeds first, then subcategories
    pub errors: Vec<CrawlError>,
}

#[derive(Debug, Default)]
struct Counters {
    discovered: AtomicUsize,
    crawled: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn snapshot(&self) -> Progress {
        Progress {
            discovered: self.discovered.load(Ordering::SeqCst),
            crawled: self.crawled.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Shared between workers: the counters and the progress sink.
///
/// Snapshots are taken and sent while holding the sink lock, so events leave
/// in the same order their counters were read.
struct Reporter {
    counters: Counters,
    sink: Mutex<Sender<CrawlEvent>>,
}

impl Reporter {
    fn new(sink: Sender<CrawlEvent>) -> Self {
        Self {
            counters: Counters::default(),
            sink: Mutex::new(sink),
        }
    }

    fn discover(&self, n: usize) {
        self.counters.discovered.fetch_add(n, Ordering::SeqCst);
    }

    fn succeed(&self, n: usize) {
        self.counters.crawled.fetch_add(n, Ordering::SeqCst);
    }

    fn fail(&self) {
        self.counters.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn emit(&self) {
        if let Ok(sink) = self.sink.lock() {
            // A consumer that went away does not stop the crawl
            let _ = sink.send(CrawlEvent::Progress(self.counters.snapshot()));
        }
    }

    fn finish(&self) -> CrawlSummary {
        let progress = self.counters.snapshot();
        let summary = CrawlSummary {
            discovered: progress.discovered,
            crawled: progress.crawled,
            errors: progress.failed,
        };
        if let Ok(sink) = self.sink.lock() {
            let _ = sink.send(CrawlEvent::Done(summary));
        }
        summary
    }
}

/// Subcategory waiting for its list document.
#[derive(Debug, Clone)]
struct Job {
    category: usize,
    subcategory: usize,
    link: String,
}

/// Crawls awesome lists through a [`DocumentFetcher`].
pub struct Crawler {
    fetcher: Arc<dyn DocumentFetcher>,
    seeds: Vec<String>,
    workers: usize,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, seeds: Vec<String>, workers: usize) -> Self {
        Self {
            fetcher,
            seeds,
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetch the first candidate document that answers.
    fn fetch_document(&self, link: &str) -> Result<(String, String), CrawlError> {
        let candidates = document_urls_for(link);
        if candidates.is_empty() {
            return Err(CrawlError::Fetch {
                url: link.to_string(),
                message: "not a list document link".to_string(),
            });
        }

        let mut last_error = String::new();
        for url in candidates {
            match self.fetcher.fetch(&url) {
                Ok(body) => {
                    debug!("fetched {} ({} bytes)", url, body.len());
                    return Ok((url, body));
                }
                Err(e) => {
                    debug!("candidate failed: {}", e);
                    last_error = e.to_string();
                }
            }
        }
        Err(CrawlError::Fetch {
            url: link.to_string(),
            message: last_error,
        })
    }

    /// Categories and unexpanded subcategories of one seed document.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch_categories(&self, seed: &str) -> Result<Vec<TreeNode>, CrawlError> {
        let (url, body) = self.fetch_document(seed)?;
        parse_seed(&url, &body).map_err(|e| parse_error(seed, e))
    }

    /// Repo leaves of one subcategory list.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch_repos(&self, link: &str) -> Result<Vec<TreeNode>, CrawlError> {
        let (url, body) = self.fetch_document(link)?;
        parse_repos(&url, &body).map_err(|e| parse_error(link, e))
    }

    /// Root with categories and subcategories only, for a walk without a
    /// cached tree. Seeds that fail are reported and skipped.
    pub fn fetch_shallow_tree(&self) -> (TreeNode, Vec<CrawlError>) {
        let mut root = TreeNode::new(ROOT_NAME);
        let mut errors = Vec::new();
        for seed in &self.seeds {
            match self.fetch_categories(seed) {
                Ok(categories) => {
                    for category in categories {
                        let _ = merge_category(&mut root, category);
                    }
                }
                Err(e) => {
                    warn!("seed skipped: {}", e);
                    errors.push(e);
                }
            }
        }
        (root, errors)
    }

    /// Crawl every seed and every subcategory list.
    ///
    /// Progress goes to `sink` as [`CrawlEvent::Progress`]; a single
    /// [`CrawlEvent::Done`] follows once all workers have finished.
    #[instrument(level = "info", skip(self, sink), fields(seeds = self.seeds.len(), workers = self.workers))]
    pub fn fetch_all_repos(&self, sink: Sender<CrawlEvent>) -> ApplicationResult<CrawlOutcome> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("crawl-{i}"))
            .build()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "start crawl worker pool".to_string(),
                source: Box::new(e),
            })?;

        let reporter = Reporter::new(sink);
        let mut errors = Vec::new();
        let mut root = TreeNode::new(ROOT_NAME);

        // Seeds: discovered up front, reported as each resolves, merged in
        // seed order
        reporter.discover(self.seeds.len());
        let seed_results: Vec<Result<Vec<TreeNode>, CrawlError>> = pool.install(|| {
            self.seeds
                .par_iter()
                .map(|seed| {
                    let result = self.fetch_categories(seed);
                    match &result {
                        Ok(_) => reporter.succeed(1),
                        Err(e) => {
                            warn!("seed failed: {}", e);
                            reporter.fail();
                        }
                    }
                    reporter.emit();
                    result
                })
                .collect()
        });

        for result in seed_results {
            match result {
                Ok(categories) => {
                    let (mut new_categories, mut new_subcategories) = (0, 0);
                    for category in categories {
                        let (c, s) = merge_category(&mut root, category);
                        new_categories += c;
                        new_subcategories += s;
                    }
                    reporter.discover(new_categories + new_subcategories);
                    // Categories need no fetch of their own; subcategories
                    // resolve in the pool.
                    reporter.succeed(new_categories);
                }
                Err(e) => errors.push(e),
            }
        }

        let jobs = collect_jobs(&root);
        info!("expanding {} subcategories", jobs.len());

        let results: Vec<Result<Vec<TreeNode>, CrawlError>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let result = self.fetch_repos(&job.link);
                    match &result {
                        Ok(repos) => {
                            // Repos are leaves: discovered and resolved together
                            reporter.discover(repos.len());
                            reporter.succeed(1 + repos.len());
                        }
                        Err(e) => {
                            warn!("subcategory failed: {}", e);
                            reporter.fail();
                        }
                    }
                    reporter.emit();
                    result
                })
                .collect()
        });

        let tree = assemble(&root, &jobs, results, &mut errors);
        let summary = reporter.finish();
        info!(
            "crawl finished: discovered={}, crawled={}, errors={}",
            summary.discovered, summary.crawled, summary.errors
        );

        Ok(CrawlOutcome {
            tree,
            summary,
            errors,
        })
    }
}

fn parse_error(link: &str, e: DomainError) -> CrawlError {
    let message = match e {
        DomainError::InvalidDocument { message, .. } => message,
        other => other.to_string(),
    };
    CrawlError::Parse {
        url: link.to_string(),
        message,
    }
}

/// Merge `category` into `root`; returns how many categories and
/// subcategories were new.
fn merge_category(root: &mut TreeNode, category: TreeNode) -> (usize, usize) {
    let new_category = usize::from(root.child(&category.name).is_none());
    let target = root.add(&category.name);
    let mut new_subcategories = 0;
    for sub in category.children() {
        if target.child(&sub.name).is_none() {
            new_subcategories += 1;
            target.add_node(TreeNode::with_url(sub.name.clone(), sub.url.clone()));
        }
    }
    (new_category, new_subcategories)
}

fn collect_jobs(root: &TreeNode) -> Vec<Job> {
    let mut jobs = Vec::new();
    for (ci, category) in root.children().iter().enumerate() {
        for (si, sub) in category.children().iter().enumerate() {
            jobs.push(Job {
                category: ci,
                subcategory: si,
                link: sub.url.clone(),
            });
        }
    }
    jobs
}

/// Build the final tree from the shallow root and the subcategory results.
///
/// Failed subcategories are left out, as are categories left without any
/// subcategory, so every Repo sits at depth 3 and only Repos are leaves.
fn assemble(
    root: &TreeNode,
    jobs: &[Job],
    results: Vec<Result<Vec<TreeNode>, CrawlError>>,
    errors: &mut Vec<CrawlError>,
) -> TreeNode {
    let mut repos_by_job: Vec<Option<Vec<TreeNode>>> = Vec::with_capacity(jobs.len());
    for result in results {
        match result {
            Ok(repos) => repos_by_job.push(Some(repos)),
            Err(e) => {
                errors.push(e);
                repos_by_job.push(None);
            }
        }
    }

    let mut tree = TreeNode::new(root.name.clone());
    for (job, repos) in jobs.iter().zip(repos_by_job) {
        let Some(repos) = repos else {
            continue;
        };
        let Some(category) = root.children().get(job.category) else {
            continue;
        };
        let Some(sub) = category.children().get(job.subcategory) else {
            continue;
        };
        let target = tree
            .add(&category.name)
            .add_node(TreeNode::with_url(sub.name.clone(), sub.url.clone()));
        for repo in repos {
            target.add_node(repo);
        }
    }
    tree
}

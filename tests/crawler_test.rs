//! Tests for the Crawler
//!
//! Counting rule: every seed, category, subcategory and repo is discovered
//! once; seeds and subcategories resolve as crawled or failed, the rest are
//! crawled when discovered.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rstest::rstest;

use awesome::application::services::{CrawlEvent, CrawlOutcome, Crawler, Progress, ROOT_NAME};
use awesome::application::CrawlError;
use awesome::domain::{NodeKind, REPO_DEPTH};
use awesome::infrastructure::traits::{DocumentFetcher, FetchError};
use awesome::util::testing::{init_test_setup, MockFetcher};

const SEED_URL: &str = "https://example.com/awesome.md";

const SEED: &str = r#"# Awesome

## Contents

- [Platforms](#platforms)
- [Tools](#tools)

## Platforms

- [Node.js](https://github.com/list/node#readme) - runtime
- [Rust](https://github.com/list/rust#readme)

## Tools

- [CLI](https://github.com/list/cli#readme)
- [Editors](https://github.com/list/editors#readme)
"#;

fn raw(repo: &str) -> String {
    format!("https://raw.githubusercontent.com/list/{repo}/HEAD/readme.md")
}

fn repos(prefix: &str) -> String {
    format!(
        "## Libraries\n- [{p}-a](https://github.com/{p}/a)\n- [{p}-b](https://github.com/{p}/b)\n\
         ## Tools\n- [{p}-c](https://{p}.example.com/)\n",
        p = prefix
    )
}

/// Two categories with two subcategories of three repos each; the Tools
/// subcategories answer with documents that have no list items.
fn fetcher() -> MockFetcher {
    MockFetcher::new()
        .with(SEED_URL, SEED)
        .with(&raw("node"), &repos("node"))
        .with(&raw("rust"), &repos("rust"))
        .with(&raw("cli"), "# CLI\n\nNothing listed yet.\n")
        .with(&raw("editors"), "# Editors\n")
}

fn crawl(fetcher: MockFetcher, seeds: &[&str], workers: usize) -> (CrawlOutcome, Vec<CrawlEvent>) {
    init_test_setup();
    let crawler = Crawler::new(
        Arc::new(fetcher),
        seeds.iter().map(|s| s.to_string()).collect(),
        workers,
    );
    let (tx, rx) = mpsc::channel();
    let outcome = crawler.fetch_all_repos(tx).unwrap();
    let events: Vec<CrawlEvent> = rx.iter().collect();
    (outcome, events)
}

#[test]
fn given_category_with_unparsable_lists_when_crawling_then_counts_follow_rule() {
    let (outcome, _) = crawl(fetcher(), &[SEED_URL], 4);

    // seed 1 + categories 2 + subcategories 4 + repos 6
    assert_eq!(outcome.summary.discovered, 13);
    assert_eq!(outcome.summary.crawled, 11);
    assert_eq!(outcome.summary.errors, 2);
    assert_eq!(
        outcome.summary.crawled + outcome.summary.errors,
        outcome.summary.discovered
    );
    assert_eq!(outcome.errors.len(), outcome.summary.errors);
    assert!(outcome
        .errors
        .iter()
        .all(|e| matches!(e, CrawlError::Parse { .. })));
}

#[test]
fn given_failed_category_when_crawling_then_it_is_pruned() {
    let (outcome, _) = crawl(fetcher(), &[SEED_URL], 4);

    assert_eq!(outcome.tree.name, ROOT_NAME);
    assert_eq!(outcome.tree.child_names(), vec!["Platforms"]);
    let platforms = outcome.tree.child("Platforms").unwrap();
    assert_eq!(platforms.child_names(), vec!["Node.js", "Rust"]);
    assert_eq!(
        platforms.child("Node.js").unwrap().child_names(),
        vec!["node-a", "node-b", "node-c"]
    );
}

#[test]
fn given_crawled_tree_when_walking_then_repos_are_exactly_at_depth_three() {
    let (outcome, _) = crawl(fetcher(), &[SEED_URL], 2);

    for (depth, node) in outcome.tree.iter() {
        if NodeKind::from_depth(depth) == NodeKind::Repo {
            assert_eq!(depth, REPO_DEPTH);
            assert!(node.is_leaf(), "repo {} has children", node.name);
        } else {
            assert!(!node.is_leaf(), "{} {} is empty", NodeKind::from_depth(depth), node.name);
        }
    }
    assert_eq!(outcome.tree.depth(), REPO_DEPTH + 1);
}

#[test]
fn given_crawl_when_draining_events_then_monotonic_and_done_last() {
    let (outcome, events) = crawl(fetcher(), &[SEED_URL], 8);

    // One event per list document: the seed and four subcategories
    assert_eq!(events.len(), 6);
    let (last, progress) = events.split_last().unwrap();
    assert_eq!(last, &CrawlEvent::Done(outcome.summary));

    let mut previous: Option<Progress> = None;
    for event in progress {
        let CrawlEvent::Progress(p) = event else {
            panic!("Done before the end: {:?}", event);
        };
        if let Some(prev) = previous {
            assert!(p.discovered >= prev.discovered);
            assert!(p.crawled >= prev.crawled);
            assert!(p.failed >= prev.failed);
        }
        previous = Some(*p);
    }
}

/// Holds back one URL until the test opens the gate.
struct GatedFetcher {
    inner: MockFetcher,
    held: String,
    gate: Mutex<Receiver<()>>,
}

impl DocumentFetcher for GatedFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url == self.held {
            if let Ok(gate) = self.gate.lock() {
                let _ = gate.recv_timeout(Duration::from_secs(5));
            }
        }
        self.inner.fetch(url)
    }
}

#[test]
fn given_slow_seed_when_crawling_then_finished_seed_reported_first() {
    init_test_setup();
    let slow = "https://example.com/slow.md";
    let (open, gate) = mpsc::channel();
    let fetcher = GatedFetcher {
        inner: fetcher(),
        held: slow.to_string(),
        gate: Mutex::new(gate),
    };
    let crawler = Crawler::new(Arc::new(fetcher), vec![slow.into(), SEED_URL.into()], 2);
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || crawler.fetch_all_repos(tx));

    let first = rx.recv_timeout(Duration::from_secs(2));
    open.send(()).unwrap();

    let Ok(CrawlEvent::Progress(p)) = first else {
        panic!("no progress while a seed was pending: {:?}", first);
    };
    assert_eq!(p.discovered, 2);
    assert_eq!(p.crawled, 1);
    assert_eq!(p.failed, 0);

    let outcome = handle.join().unwrap().unwrap();
    assert!(matches!(&outcome.errors[0], CrawlError::Fetch { url, .. } if url == slow));
    assert_eq!(outcome.tree.child_names(), vec!["Platforms"]);
}

#[test]
fn given_unreachable_seed_when_crawling_then_recorded_and_others_kept() {
    let missing = "https://example.com/missing.md";
    let (outcome, _) = crawl(fetcher(), &[missing, SEED_URL], 4);

    assert_eq!(outcome.summary.discovered, 14);
    assert_eq!(outcome.summary.errors, 3);
    assert!(matches!(&outcome.errors[0], CrawlError::Fetch { url, .. } if url == missing));
    assert_eq!(outcome.tree.child_names(), vec!["Platforms"]);
}

#[test]
fn given_missing_lowercase_readme_when_crawling_then_uppercase_is_tried() {
    let fetcher = MockFetcher::new()
        .with(SEED_URL, "## Platforms\n- [Node.js](https://github.com/list/node)\n")
        .with(
            "https://raw.githubusercontent.com/list/node/HEAD/README.md",
            &repos("node"),
        );
    let (outcome, _) = crawl(fetcher, &[SEED_URL], 1);

    assert_eq!(outcome.summary.errors, 0);
    assert_eq!(outcome.tree.leaves().len(), 3);
}

#[test]
fn given_same_category_in_two_seeds_when_crawling_then_merged() {
    let second = "https://example.com/second.md";
    let fetcher = fetcher().with(
        second,
        "## Platforms\n- [Rust](https://github.com/list/rust)\n- [Go](https://github.com/list/go)\n",
    );
    let (outcome, _) = crawl(fetcher, &[SEED_URL, second], 4);

    let platforms = outcome.tree.child("Platforms").unwrap();
    assert_eq!(platforms.child_names(), vec!["Node.js", "Rust"]);
    // Go is discovered and fails; Rust is not counted twice
    assert_eq!(outcome.summary.discovered, 15);
    assert_eq!(outcome.summary.errors, 3);
    assert_eq!(
        outcome.summary.crawled + outcome.summary.errors,
        outcome.summary.discovered
    );
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(64)]
fn given_any_pool_size_when_crawling_then_tree_order_is_stable(#[case] workers: usize) {
    let (outcome, _) = crawl(fetcher(), &[SEED_URL], workers);

    let names: Vec<_> = outcome.tree.iter().map(|(_, n)| n.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            "awesome", "Platforms", "Node.js", "node-a", "node-b", "node-c", "Rust", "rust-a",
            "rust-b", "rust-c",
        ]
    );
}

#[test]
fn given_oversized_pool_when_creating_then_clamped() {
    let crawler = Crawler::new(Arc::new(MockFetcher::new()), vec![SEED_URL.into()], 500);
    assert_eq!(crawler.workers(), 64);
    let crawler = Crawler::new(Arc::new(MockFetcher::new()), vec![SEED_URL.into()], 0);
    assert_eq!(crawler.workers(), 1);
}

#[test]
fn given_seeds_when_fetching_shallow_tree_then_subcategories_unexpanded() {
    let crawler = Crawler::new(Arc::new(fetcher()), vec![SEED_URL.into()], 4);

    let (tree, errors) = crawler.fetch_shallow_tree();

    assert!(errors.is_empty());
    assert_eq!(tree.child_names(), vec!["Platforms", "Tools"]);
    let cli = tree.child("Tools").unwrap().child("CLI").unwrap();
    assert!(cli.is_leaf());
    assert_eq!(cli.url, "https://github.com/list/cli#readme");
}

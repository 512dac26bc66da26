//! Crawl progress rendering
//!
//! Drains the crawl event stream and keeps a single status line updated on
//! stderr until the `Done` sentinel arrives.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use colored::Colorize;

use crate::application::services::{CrawlEvent, CrawlSummary, Progress};

/// Status line for one progress snapshot.
pub fn status_line(progress: &Progress) -> String {
    format!(
        "Discovered {}  Crawled {}  Failed {}",
        progress.discovered,
        progress.crawled.to_string().green(),
        progress.failed.to_string().red()
    )
}

/// Render events from `events` into `out` until `Done` or until every sender
/// is gone. Returns the summary when one arrived.
pub fn render(events: Receiver<CrawlEvent>, mut out: impl Write) -> Option<CrawlSummary> {
    for event in events {
        match event {
            CrawlEvent::Progress(progress) => {
                // \r and clear-to-end rewrite the same terminal line
                let _ = write!(out, "\r{}\x1b[K", status_line(&progress));
                let _ = out.flush();
            }
            CrawlEvent::Done(summary) => {
                let _ = writeln!(out);
                let _ = out.flush();
                return Some(summary);
            }
        }
    }
    None
}

/// Spawn a renderer thread writing to stderr.
pub fn spawn() -> (Sender<CrawlEvent>, JoinHandle<Option<CrawlSummary>>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || render(rx, std::io::stderr()));
    (tx, handle)
}

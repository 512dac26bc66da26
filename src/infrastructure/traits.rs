//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Longest wait honoured from a `Retry-After` header.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// A list document could not be retrieved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url}: {message}")]
    Transport { url: String, message: String },
}

/// Retrieves list documents by URL.
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the document body at `url`.
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Flat keyed cache: one opaque blob per key.
pub trait CacheStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if there is none.
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the blob under `key` atomically.
    fn write(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove the blob under `key`; missing keys are not an error.
    fn remove(&self, key: &str) -> io::Result<()>;

    /// Where the blob for `key` lives, for display.
    fn location(&self, key: &str) -> String;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Actual value (the child label)
    pub value: String,
}

impl SelectionItem {
    pub fn labelled(label: &str) -> Self {
        Self {
            display: label.to_string(),
            value: label.to_string(),
        }
    }
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String>;
}

/// Opens a URL for the user.
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// HTTP(S) document fetcher on a blocking reqwest client.
///
/// `file://` URLs are read from disk. Responses with 429 or 503 are retried
/// up to `max_retries` times with exponential back-off, honouring
/// `Retry-After` when present.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpFetcher {
    pub fn new(
        user_agent: &str,
        timeout: Option<Duration>,
        max_retries: u32,
    ) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(user_agent.to_string());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Transport {
            url: String::new(),
            message: format!("build http client: {e}"),
        })?;
        Ok(Self {
            client,
            max_retries,
            base_delay: Duration::from_millis(500),
        })
    }

    fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or_else(|| self.base_delay * 2u32.saturating_pow(attempt))
            .min(MAX_BACKOFF)
    }

    fn fetch_file(url: &str) -> Result<String, FetchError> {
        let path = url.trim_start_matches("file://");
        std::fs::read_to_string(path).map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl DocumentFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.starts_with("file://") {
            return Self::fetch_file(url);
        }

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(url)
                .send()
                .map_err(|e| FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status.is_success() {
                return response.text().map_err(|e| FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }

            let throttled =
                status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE;
            if !throttled || attempt >= self.max_retries {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let delay = self.backoff(attempt, retry_after);
            warn!("{} answered {}, retrying in {:?}", url, status, delay);
            thread::sleep(delay);
            attempt += 1;
        }
    }
}

/// Cache store keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`; characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let file = if file.is_empty() { "_".to_string() } else { file };
        self.dir.join(format!("{file}.json"))
    }
}

impl CacheStore for FileCacheStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(level = "debug", skip(self, value), fields(bytes = value.len()))]
    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        // Temp file in the same directory so the rename stays on one filesystem
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        debug!("cache write: {}", target.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn location(&self, key: &str) -> String {
        self.path_for(key).display().to_string()
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        std::process::Command::new(cmd).args(args).output()
    }
}

/// Opens URLs with the configured command or the platform opener.
pub struct SystemBrowser {
    command: Option<String>,
    runner: std::sync::Arc<dyn CommandRunner>,
}

impl SystemBrowser {
    pub fn new(command: Option<String>, runner: std::sync::Arc<dyn CommandRunner>) -> Self {
        Self { command, runner }
    }

    fn platform_opener() -> (&'static str, Vec<&'static str>) {
        if cfg!(target_os = "macos") {
            ("open", vec![])
        } else if cfg!(target_os = "windows") {
            ("cmd", vec!["/C", "start", ""])
        } else {
            ("xdg-open", vec![])
        }
    }
}

impl Browser for SystemBrowser {
    #[instrument(level = "debug", skip(self))]
    fn open(&self, url: &str) -> io::Result<()> {
        let output = match self.command.as_deref() {
            Some(cmd) if !cmd.trim().is_empty() => {
                let mut parts = cmd.split_whitespace();
                let program = parts.next().unwrap_or(cmd);
                let mut args: Vec<&str> = parts.collect();
                args.push(url);
                self.runner.run(program, &args)?
            }
            _ => {
                let (program, base) = Self::platform_opener();
                let mut args: Vec<&str> = base;
                args.push(url);
                self.runner.run(program, &args)?
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "browser exited with status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ))
        }
    }
}

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector;

impl Selector for SkimSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        // Build input as newline-separated display strings
        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some("50%"))
            .multi(false)
            .build()
            .map_err(|e| format!("failed to build skim options: {e}"))?;

        let item_reader = SkimItemReader::default();
        let items_arc = item_reader.of_bufread(Cursor::new(input));

        match Skim::run_with(&options, Some(items_arc)) {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => Ok(out.selected_items.first().and_then(|selected| {
                let display = selected.output().to_string();
                items.iter().find(|i| i.display == display).cloned()
            })),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_odd_key_when_building_path_then_sanitizes() {
        let store = FileCacheStore::new("/tmp/cache");
        assert_eq!(store.path_for("awesome"), PathBuf::from("/tmp/cache/awesome.json"));
        assert_eq!(store.path_for("../x y"), PathBuf::from("/tmp/cache/___x_y.json"));
        assert_eq!(store.path_for(""), PathBuf::from("/tmp/cache/_.json"));
    }

    #[test]
    fn given_missing_key_when_reading_then_none() {
        let temp = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp.path().join("nested"));
        assert_eq!(store.read("awesome").unwrap(), None);
        store.remove("awesome").unwrap();
    }

    #[test]
    fn given_written_key_when_overwriting_then_last_value_wins() {
        let temp = TempDir::new().unwrap();
        let store = FileCacheStore::new(temp.path());
        store.write("awesome", "first").unwrap();
        store.write("awesome", "second").unwrap();
        assert_eq!(store.read("awesome").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn given_local_file_url_when_fetching_then_reads_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("readme.md");
        std::fs::write(&path, "## A\n").unwrap();
        let fetcher = HttpFetcher::new("awesome-test", None, 0).unwrap();

        let body = fetcher.fetch(&format!("file://{}", path.display())).unwrap();

        assert_eq!(body, "## A\n");
        assert!(fetcher.fetch("file:///does/not/exist.md").is_err());
    }

    #[test]
    fn given_retry_after_when_computing_backoff_then_capped() {
        let fetcher = HttpFetcher::new("awesome-test", None, 2).unwrap();
        assert_eq!(fetcher.backoff(0, None), Duration::from_millis(500));
        assert_eq!(fetcher.backoff(2, None), Duration::from_secs(2));
        assert_eq!(
            fetcher.backoff(0, Some(Duration::from_secs(600))),
            MAX_BACKOFF
        );
    }
}

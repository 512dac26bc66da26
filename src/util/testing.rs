//! Test support: logging setup and in-memory doubles for the I/O traits.

use std::collections::HashMap;
use std::env;
use std::io;
use std::sync::{Mutex, Once};

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::infrastructure::traits::{
    Browser, CacheStore, DocumentFetcher, FetchError, SelectionItem, Selector,
};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Fetcher answering from a fixed URL → body map; unknown URLs are 404.
#[derive(Debug, Default)]
pub struct MockFetcher {
    documents: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.documents.insert(url.to_string(), body.to_string());
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl DocumentFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Cache store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "cache lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory:{key}")
    }
}

/// Selector answering with scripted labels, one per prompt.
///
/// `None` in the script cancels that prompt; an exhausted script cancels too.
#[derive(Debug, Default)]
pub struct ScriptedSelector {
    answers: Mutex<Vec<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedSelector {
    pub fn new(answers: &[Option<&str>]) -> Self {
        let mut answers: Vec<Option<String>> =
            answers.iter().map(|a| a.map(str::to_string)).collect();
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Selector for ScriptedSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let answer = self
            .answers
            .lock()
            .map_err(|_| "selector lock poisoned".to_string())?
            .pop()
            .flatten();
        match answer {
            None => Ok(None),
            Some(label) => items
                .iter()
                .find(|i| i.value == label)
                .cloned()
                .map(Some)
                .ok_or_else(|| format!("'{label}' not offered")),
        }
    }
}

/// Browser that records opened URLs.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
    }

    #[test]
    fn given_script_when_selecting_then_answers_in_order() {
        let selector = ScriptedSelector::new(&[Some("b"), None]);
        let items = vec![SelectionItem::labelled("a"), SelectionItem::labelled("b")];

        assert_eq!(
            selector.select_one(&items, "1> ").unwrap(),
            Some(SelectionItem::labelled("b"))
        );
        assert_eq!(selector.select_one(&items, "2> ").unwrap(), None);
        assert_eq!(selector.select_one(&items, "3> ").unwrap(), None);
        assert_eq!(selector.prompts(), vec!["1> ", "2> ", "3> "]);
    }
}

//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Selection against the navigator tree that cannot be honoured.
///
/// Labels offered to the user always come from the node being navigated, so
/// these indicate a logic defect in the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no entry named '{label}' under '{}'", display_path(.path))]
    NotFound { label: String, path: Vec<String> },

    #[error("'{}' is not a repository", display_path(.path))]
    NotARepo { path: Vec<String> },

    #[error("'{}' is not a subcategory", display_path(.path))]
    NotExpandable { path: Vec<String> },
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.join(" / ")
    }
}

/// Domain errors represent business logic violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("invalid list document {url}: {message}")]
    InvalidDocument { url: String, message: String },
}

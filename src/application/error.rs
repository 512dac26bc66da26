//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// One list document that did not make it into the tree.
///
/// Collected by the crawler; never aborts a crawl.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrawlError {
    #[error("fetch failed: {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("parse failed: {url}: {message}")]
    Parse { url: String, message: String },
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Crawl(#[from] CrawlError),

    #[error("cache '{key}': {message}")]
    Cache { key: String, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("nothing to pick under '{path}'")]
    NothingToPick { path: String },

    #[error("selection failed: {message}")]
    Selection { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<crate::domain::NavigationError> for ApplicationError {
    fn from(e: crate::domain::NavigationError) -> Self {
        ApplicationError::Domain(DomainError::Navigation(e))
    }
}

impl ApplicationError {
    /// True for errors that reveal a defect in how the tree was walked.
    pub fn is_navigation(&self) -> bool {
        matches!(self, ApplicationError::Domain(DomainError::Navigation(_)))
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

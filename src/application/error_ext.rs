//! Error conversion helpers for cache I/O
//!
//! Provides extension traits for cleaner error handling with key context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add cache key context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// cache.write(TREE_CACHE_KEY, &blob)
    ///     .with_key_context("write", TREE_CACHE_KEY)?;
    /// ```
    fn with_key_context(self, action: &str, key: &str) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_key_context(self, action: &str, key: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Cache {
            key: key.to_string(),
            message: format!("{}: {}", action, e),
        })
    }
}

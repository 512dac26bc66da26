//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::{ApplicationError, CrawlError};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Http(_) | InfraError::Browser { .. } => crate::exitcode::UNAVAILABLE,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Cache { .. } => crate::exitcode::CANTCREAT,
                    ApplicationError::Crawl(CrawlError::Fetch { .. }) => crate::exitcode::UNAVAILABLE,
                    ApplicationError::Crawl(CrawlError::Parse { .. }) => crate::exitcode::DATAERR,
                    ApplicationError::NothingToPick { .. } => crate::exitcode::NOINPUT,
                    _ => crate::exitcode::SOFTWARE,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_config_error_when_mapping_then_exit_config() {
        let err: CliError = ApplicationError::Config {
            message: "bad".into(),
        }
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }

    #[test]
    fn given_unreachable_seed_when_mapping_then_exit_unavailable() {
        let err: CliError = ApplicationError::from(CrawlError::Fetch {
            url: "https://example.com".into(),
            message: "timeout".into(),
        })
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::UNAVAILABLE);
        assert_eq!(CliError::Usage("x".into()).exit_code(), crate::exitcode::USAGE);
    }
}

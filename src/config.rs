//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/awesome/awesome.toml`
//! 3. Environment variables: `AWESOME_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// List document every crawl starts from when no seeds are configured.
pub const DEFAULT_SEED: &str = "https://github.com/sindresorhus/awesome";

/// Default size of the crawl worker pool.
pub const DEFAULT_WORKERS: usize = 16;

/// Largest accepted worker pool.
pub const MAX_WORKERS: usize = 64;

/// Unified configuration for awesome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// List documents the crawl starts from
    pub seeds: Vec<String>,
    /// Concurrent list document fetches (1..=64)
    pub workers: usize,
    /// Directory of the favourites and tree cache
    pub cache_dir: PathBuf,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Per-request timeout; transport default when unset
    pub timeout_secs: Option<u64>,
    /// Retries on HTTP 429/503
    pub max_retries: u32,
    /// Command used to open repos; platform opener when unset
    pub browser: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seeds: vec![DEFAULT_SEED.to_string()],
            workers: DEFAULT_WORKERS,
            cache_dir: default_cache_dir(),
            user_agent: format!("awesome/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
            max_retries: 2,
            browser: None,
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub seeds: Option<Vec<String>>,
    pub workers: Option<usize>,
    pub cache_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub browser: Option<String>,
}

fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "awesome")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.cache/awesome"))
}

/// Get the XDG config directory for awesome.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "awesome").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("awesome.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    ///
    /// Unknown variables are left as written.
    fn expand_paths(&mut self) {
        let raw = self.cache_dir.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| shellexpand::tilde(&raw).into_owned());
        self.cache_dir = PathBuf::from(expanded);

        if let Some(browser) = &self.browser {
            self.browser = Some(shellexpand::tilde(browser).into_owned());
        }
    }

    /// Overlay explicitly specified values; arrays replace.
    pub fn apply(&self, overlay: &RawSettings) -> Self {
        Self {
            seeds: overlay.seeds.clone().unwrap_or_else(|| self.seeds.clone()),
            workers: overlay.workers.unwrap_or(self.workers),
            cache_dir: overlay
                .cache_dir
                .clone()
                .unwrap_or_else(|| self.cache_dir.clone()),
            user_agent: overlay
                .user_agent
                .clone()
                .unwrap_or_else(|| self.user_agent.clone()),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            max_retries: overlay.max_retries.unwrap_or(self.max_retries),
            browser: overlay.browser.clone().or_else(|| self.browser.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/awesome/awesome.toml`
    /// 3. Environment variables: `AWESOME_*` prefix
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Same as [`Settings::load`] with an explicit global config file.
    pub fn load_from(global_path: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.apply(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply AWESOME_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("AWESOME")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("seeds")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("seeds") {
            settings.seeds = val;
        }
        if let Ok(val) = config.get::<usize>("workers") {
            settings.workers = val;
        }
        if let Ok(val) = config.get_string("cache_dir") {
            settings.cache_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("user_agent") {
            settings.user_agent = val;
        }
        if let Ok(val) = config.get::<u64>("timeout_secs") {
            settings.timeout_secs = Some(val);
        }
        if let Ok(val) = config.get::<u32>("max_retries") {
            settings.max_retries = val;
        }
        if let Ok(val) = config.get_string("browser") {
            settings.browser = Some(val);
        }

        Ok(settings)
    }

    /// Reject settings no crawl can run with; clamp the worker pool.
    fn validate(&mut self) -> Result<(), ApplicationError> {
        self.seeds.retain(|s| !s.trim().is_empty());
        if self.seeds.is_empty() {
            return Err(ApplicationError::Config {
                message: "at least one seed is required".to_string(),
            });
        }
        self.workers = self.workers.clamp(1, MAX_WORKERS);
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        format!(
            r#"# awesome configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/awesome/awesome.toml
#   Env:    AWESOME_* environment variables (AWESOME_SEEDS is comma separated)

# List documents the crawl starts from
# seeds = ["{DEFAULT_SEED}"]

# Concurrent document fetches during `awesome cache` (1..=64)
# workers = {DEFAULT_WORKERS}

# Favourites and crawled tree
# cache_dir = "~/.cache/awesome"

# user_agent = "awesome"
# timeout_secs = 30

# Retries on HTTP 429/503, with exponential back-off
# max_retries = 2

# Command that opens a repo URL (default: xdg-open / open / start)
# browser = "firefox"
"#
        )
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_uses_upstream_seed() {
        let settings = Settings::default();
        assert_eq!(settings.seeds, vec![DEFAULT_SEED.to_string()]);
        assert_eq!(settings.workers, DEFAULT_WORKERS);
        assert!(settings.browser.is_none());
    }

    #[test]
    fn given_partial_overlay_when_applying_then_keeps_unspecified() {
        let overlay = RawSettings {
            workers: Some(4),
            browser: Some("firefox".into()),
            ..Default::default()
        };
        let merged = Settings::default().apply(&overlay);
        assert_eq!(merged.workers, 4);
        assert_eq!(merged.browser.as_deref(), Some("firefox"));
        assert_eq!(merged.seeds, vec![DEFAULT_SEED.to_string()]);
    }

    #[test]
    fn given_oversized_pool_when_validating_then_clamps() {
        let mut settings = Settings {
            workers: 1000,
            ..Default::default()
        };
        settings.validate().unwrap();
        assert_eq!(settings.workers, MAX_WORKERS);

        settings.workers = 0;
        settings.validate().unwrap();
        assert_eq!(settings.workers, 1);
    }

    #[test]
    fn given_blank_seeds_when_validating_then_errors() {
        let mut settings = Settings {
            seeds: vec!["  ".into()],
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.seeds.is_none());
    }
}

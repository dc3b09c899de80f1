//! Configuration management for the CLI.

use std::env;
use std::path::PathBuf;

const DEFAULT_STORE_DIR: &str = "./tabsync-data";

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one snapshot file per table
    pub store_dir: PathBuf,
    /// Page size for the bounded-memory differ; unset means in-memory
    pub page_size: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_dir = lookup("TABSYNC_STORE_DIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_STORE_DIR.to_string())
            .into();

        let page_size = lookup("TABSYNC_PAGE_SIZE")
            .map(|value| parse_page_size(&value))
            .transpose()?;

        Ok(Self {
            store_dir,
            page_size,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(
        mut self,
        store_dir: Option<PathBuf>,
        page_size: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if let Some(store_dir) = store_dir {
            self.store_dir = store_dir;
        }
        if let Some(page_size) = page_size {
            if page_size == 0 {
                return Err(ConfigError::InvalidPageSize(page_size.to_string()));
            }
            self.page_size = Some(page_size);
        }
        Ok(self)
    }
}

fn parse_page_size(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidPageSize(value.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TABSYNC_PAGE_SIZE value: {0:?} (expected a positive integer)")]
    InvalidPageSize(String),
}

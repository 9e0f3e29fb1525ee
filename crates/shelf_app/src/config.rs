//! Startup configuration, read from a RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shelf_core::{OwnerId, DEFAULT_PAGE_SIZE};
use shelf_engine::{AuthContext, EngineConfig, FetchSettings, StoreBackend};
use shelf_logging::{LevelFilter, LogDestination};

pub const DEFAULT_CONFIG_PATH: &str = "shelf.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File(PathBuf),
    Terminal,
    Both(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Owner every request runs as. `None` leaves the session anonymous.
    pub owner: Option<String>,
    /// JSON snapshot of the reading list. `None` keeps it in memory.
    pub data_file: Option<PathBuf>,
    pub page_size: usize,
    pub search_debounce_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub log_destination: LogTarget,
    pub log_level: String,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            owner: Some("local".to_string()),
            data_file: Some(PathBuf::from("shelf.json")),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce_ms: 300,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            log_destination: LogTarget::File(PathBuf::from("shelf.log")),
            log_level: "info".to_string(),
        }
    }
}

impl ShelfConfig {
    pub fn log_destination(&self) -> LogDestination {
        match &self.log_destination {
            LogTarget::File(path) => LogDestination::File(path.clone()),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both(path) => LogDestination::Both(path.clone()),
        }
    }

    /// Unknown level names fall back to `Info`.
    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        let auth = match self.owner.as_deref().map(str::trim) {
            Some(owner) if !owner.is_empty() => AuthContext::authenticated(OwnerId::new(owner)),
            _ => AuthContext::anonymous(),
        };
        let store = match &self.data_file {
            Some(path) => StoreBackend::File(path.clone()),
            None => StoreBackend::Memory,
        };
        let mut config = EngineConfig::new(auth, store);
        config.fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        };
        config
    }
}

/// Read `path`. A missing file yields the defaults; anything unreadable or
/// malformed is an error.
pub fn load(path: &Path) -> Result<ShelfConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ShelfConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };
    ron::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
}

// ⚙️ Runtime configuration, read from the environment

use crate::categorization::{CategorizationEngine, KeywordDictionary, ScoringConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "FINANCE_TRACKER_DB";
pub const ENV_BIND_ADDR: &str = "FINANCE_TRACKER_ADDR";
pub const ENV_KEYWORDS_PATH: &str = "FINANCE_TRACKER_KEYWORDS";
pub const ENV_LOG_FILTER: &str = "RUST_LOG";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "finance_tracker=info";
const DB_FILE_NAME: &str = "finance-tracker.db";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite file holding categories and feedback
    pub db_path: PathBuf,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Optional JSON keyword dictionary replacing the built-in one
    pub keywords_path: Option<PathBuf>,

    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: default_db_path(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            keywords_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        AppConfig {
            db_path: get(ENV_DB_PATH).map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_addr: get(ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
            keywords_path: get(ENV_KEYWORDS_PATH).map(PathBuf::from),
            log_filter: get(ENV_LOG_FILTER).unwrap_or(defaults.log_filter),
        }
    }

    /// Keyword dictionary from `keywords_path`, or the built-in one
    pub fn load_dictionary(&self) -> Result<KeywordDictionary> {
        match &self.keywords_path {
            Some(path) => KeywordDictionary::from_file(path)
                .with_context(|| format!("Failed to load keyword dictionary {:?}", path)),
            None => Ok(KeywordDictionary::builtin()),
        }
    }

    pub fn build_engine(&self) -> Result<CategorizationEngine> {
        Ok(CategorizationEngine::new(self.load_dictionary()?, ScoringConfig::default()))
    }
}

/// `<data dir>/finance-tracker/finance-tracker.db`, or the working directory
/// when the platform has no data dir
fn default_db_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("finance-tracker").join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

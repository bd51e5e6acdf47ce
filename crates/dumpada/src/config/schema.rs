use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::actor::DEFAULT_ACTOR;
use crate::db::default_database_path;
use crate::sample::StatusPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub status_policy: StatusPolicy,
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    #[serde(default = "default_actor")]
    pub default_actor: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

impl Config {
    /// The configured database file, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(default_database_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            status_policy: StatusPolicy::default(),
            max_conflict_retries: default_max_conflict_retries(),
            default_actor: default_actor(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

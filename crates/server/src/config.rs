//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use style_lib::store::{PersistenceMode, DEFAULT_MEMORY_CAPACITY};

/// Environment variable prefix, e.g. `LSD_PORT`
pub const ENV_PREFIX: &str = "LSD";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Name attached to structured log events
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `model.json` and `preprocessor.json`
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default = "default_persistence")]
    pub persistence: PersistenceMode,

    /// Prediction log used when persistence is `file`
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Predictions kept when persistence is `memory`; oldest are evicted
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Upper bound on `GET /predictions?limit=`
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: usize,
}

fn default_service_name() -> String {
    "learning-style-api".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_persistence() -> PersistenceMode {
    PersistenceMode::Memory
}

fn default_store_path() -> PathBuf {
    PathBuf::from("predictions.jsonl")
}

fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}

fn default_max_list_limit() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            host: default_host(),
            port: default_port(),
            artifact_dir: default_artifact_dir(),
            persistence: default_persistence(),
            store_path: default_store_path(),
            memory_capacity: default_memory_capacity(),
            max_list_limit: default_max_list_limit(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `LSD_`-prefixed environment variables
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    pub fn from_source(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read service configuration")?;

        config
            .try_deserialize()
            .context("Invalid service configuration")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

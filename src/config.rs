use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NeuroVaultConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub validation: ValidationConfig,
    pub retrieval: RetrievalConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"http"` (REST API plus MCP at `/mcp`) or `"stdio"` (MCP only).
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValidationConfig {
    /// Queue an internal validation right after every create.
    pub validate_on_create: bool,
    pub sync_validator: String,
    pub trigger_validator: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_similar_limit: i64,
    pub default_list_limit: i64,
    pub history_limit: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WorkerConfig {
    pub backend_url: String,
    pub poll_interval_secs: u64,
    pub batch_size: i64,
    pub validator_address: String,
    /// Without a key the worker never submits and runs in dry-run mode.
    pub validator_key: Option<String>,
    pub pending_only: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "http".into(),
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_neurovault_dir()
            .join("neurovault.sqlite3")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_on_create: false,
            sync_validator: "internal-sync".into(),
            trigger_validator: "trigger".into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_similar_limit: 5,
            default_list_limit: 100,
            history_limit: 10,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".into(),
            poll_interval_secs: 30,
            batch_size: 5,
            validator_address: format!("0x{}", "0".repeat(40)),
            validator_key: None,
            pending_only: true,
            request_timeout_secs: 5,
        }
    }
}

/// Returns `~/.neurovault/`, or `./.neurovault/` when no home directory is known.
pub fn default_neurovault_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".neurovault")
}

/// Returns the default config file path: `~/.neurovault/config.toml`
pub fn default_config_path() -> PathBuf {
    default_neurovault_dir().join("config.toml")
}

impl NeuroVaultConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            NeuroVaultConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("NEUROVAULT_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("NEUROVAULT_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("NEUROVAULT_VALIDATE_SYNC") {
            self.validation.validate_on_create =
                matches!(val.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("NEUROVAULT_BACKEND_URL") {
            self.worker.backend_url = val;
        }
        if let Ok(val) = std::env::var("NEUROVAULT_VALIDATOR_KEY") {
            if !val.is_empty() {
                self.worker.validator_key = Some(val);
            }
        }
        if let Ok(val) = std::env::var("NEUROVAULT_VALIDATOR_ADDRESS") {
            self.worker.validator_address = val;
        }
        if let Some(secs) = env_parse::<u64>("NEUROVAULT_POLL_INTERVAL") {
            self.worker.poll_interval_secs = secs;
        }
        if let Some(size) = env_parse::<i64>("NEUROVAULT_BATCH_SIZE") {
            self.worker.batch_size = size;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    match std::env::var(key) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(key, value = %val, "ignoring unparsable env override");
                None
            }
        },
        Err(_) => None,
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

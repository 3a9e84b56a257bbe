use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable holding the upstream API credential.
pub const API_KEY_ENV: &str = "YELP_API_KEY";

const DATABASE_PATH_ENV: &str = "FINDIT_DATABASE_PATH";
const PORT_ENV: &str = "FINDIT_PORT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub yelp: YelpConfig,

    pub export: ExportConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" (default) or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/businesses.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost".to_string(),
                "http://localhost:8000".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YelpConfig {
    pub api_url: String,

    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: String,

    /// Per-call transport timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,

    pub user_agent: String,

    /// Retries of a single rate-limited page before pagination gives up.
    pub rate_limit_max_retries: u32,

    /// First rate-limit backoff; doubles on each further retry.
    pub rate_limit_base_delay_ms: u64,

    /// Upper bound for a single rate-limit backoff.
    pub rate_limit_max_delay_ms: u64,
}

impl Default for YelpConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.yelp.com/v3/businesses/search".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 10,
            user_agent: concat!("findit/", env!("CARGO_PKG_VERSION")).to_string(),
            rate_limit_max_retries: 5,
            rate_limit_base_delay_ms: 2_000,
            rate_limit_max_delay_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub export_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            export_dir: "exports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            yelp: YelpConfig::default(),
            export: ExportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found (or defaults), then applies `.env`
    /// and process environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Applies environment overrides through `lookup` so tests need not touch
    /// the real process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV) {
            self.yelp.api_key = key.trim().to_string();
        }

        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            self.general.database_path = path;
        }

        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} is not a valid port: {port}"))?;
        }

        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("findit").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".findit").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.yelp.api_key.is_empty() {
            anyhow::bail!("Missing {API_KEY_ENV} in environment or .env file");
        }

        if self.yelp.api_url.is_empty() {
            anyhow::bail!("Yelp API URL cannot be empty");
        }

        url::Url::parse(&self.yelp.api_url)
            .with_context(|| format!("Invalid Yelp API URL: {}", self.yelp.api_url))?;

        if self.yelp.request_timeout_seconds == 0 {
            anyhow::bail!("Yelp request timeout must be > 0");
        }

        if self.yelp.rate_limit_base_delay_ms > self.yelp.rate_limit_max_delay_ms {
            anyhow::bail!("Rate limit base delay cannot exceed the max delay");
        }

        if self.server.enabled && self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}

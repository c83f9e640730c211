//! Configuration management
//!
//! Configuration is loaded from a YAML file, then overlaid with a small set
//! of environment variables (provider API keys are env-only so they never
//! land in a checked-in file). Every section has working defaults; a
//! missing config file yields a service that talks to a local Ollama and
//! logs calls to an in-memory sink.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::utils::error::{Result, ServiceError};

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model gateway configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Orchestration loop configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// External provider credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Call log storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ServiceError::Config(format!("Failed to parse config: {}", e)))?;

        config.apply_env();
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables onto the loaded configuration
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            self.providers.openweather_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("NEWSAPI_KEY") {
            self.providers.newsapi_key = Some(key);
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.model.base_url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.model.model = model;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.database.url = url;
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServiceError::Config("server port cannot be 0".to_string()));
        }
        if self.orchestrator.max_turns == 0 {
            return Err(ServiceError::Config(
                "orchestrator max_turns cannot be 0".to_string(),
            ));
        }
        if self.model.base_url.is_empty() {
            return Err(ServiceError::Config(
                "model base_url cannot be empty".to_string(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(ServiceError::Config(
                "model timeout_secs cannot be 0".to_string(),
            ));
        }
        if self.storage.database.enabled && self.storage.database.url.is_empty() {
            return Err(ServiceError::Config(
                "storage database url cannot be empty when enabled".to_string(),
            ));
        }
        if self.providers.openweather_api_key.is_none() {
            warn!("OPENWEATHER_API_KEY not set; weather lookups will fail");
        }
        if self.providers.newsapi_key.is_none() {
            warn!("NEWSAPI_KEY not set; news lookups will fail");
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads (defaults to actix's per-core choice)
    pub workers: Option<usize>,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout: u64,
    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            timeout: default_request_timeout(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allowed origins (empty means allow any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Max age for preflight requests
    #[serde(default = "default_cors_max_age")]
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![],
            max_age: default_cors_max_age(),
        }
    }
}

/// Model gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    /// Model identifier passed to the backend
    #[serde(default = "default_model_name")]
    pub model: String,
    /// How long the backend keeps the model loaded between calls
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,
    /// Per-round-trip timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            model: default_model_name(),
            keep_alive: default_keep_alive(),
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound on model round-trips per chat request
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Per-function-call execution timeout in seconds
    #[serde(default = "default_function_timeout")]
    pub function_timeout_secs: u64,
    /// Also write call log records for argument-rejected calls
    #[serde(default)]
    pub log_rejected_arguments: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            function_timeout_secs: default_function_timeout(),
            log_rejected_arguments: false,
        }
    }
}

/// External provider credentials
///
/// Keys are optional at startup; a function whose key is missing reports an
/// execution failure when called rather than preventing boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenWeatherMap API key
    pub openweather_api_key: Option<String>,
    /// NewsAPI key
    pub newsapi_key: Option<String>,
}

/// Call log storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Persist the call log (in-memory sink when disabled)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            enabled: true,
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_cors_max_age() -> u32 {
    3600
}

fn default_model_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model_name() -> String {
    "llama3.1:8b".to_string()
}

fn default_keep_alive() -> String {
    "5m".to_string()
}

fn default_model_timeout() -> u64 {
    90
}

fn default_max_turns() -> u32 {
    5
}

fn default_function_timeout() -> u64 {
    15
}

fn default_database_url() -> String {
    "sqlite://function_calls.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_connection_timeout() -> u64 {
    10
}

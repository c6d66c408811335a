//! Configuration management for FilingForge binaries
//!
//! Supports loading configuration from:
//! - A `.env` file (loaded by the binaries through dotenvy)
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// External registry (EDGAR) configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Ingestion run configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Report output configuration
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_username")]
    pub username: String,

    /// Storage credential. Never has a default; read from APP__DATABASE__PASSWORD.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Database name
    #[serde(default = "default_db_name")]
    pub name: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Submissions endpoint; `{cik}` is replaced by the 10-digit padded CIK
    #[serde(default = "default_submissions_url")]
    pub submissions_url: String,

    /// EDGAR fair-access policy requires a descriptive User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_registry_timeout")]
    pub timeout_secs: u64,

    /// Outbound request budget
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Ticker → CIK mapping file
    #[serde(default = "default_tickers_path")]
    pub tickers_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportsConfig {
    /// Directory report files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (debug, info, filingforge_ingestion=debug, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name attached to log lines
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_db_host() -> String { "localhost".to_string() }
fn default_db_port() -> u16 { 5432 }
fn default_db_username() -> String { "filingforge".to_string() }
fn default_db_name() -> String { "companies".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_submissions_url() -> String { "https://data.sec.gov/submissions/CIK{cik}.json".to_string() }
fn default_user_agent() -> String { "FilingForge/0.3 (ops@filingforge.dev)".to_string() }
fn default_registry_timeout() -> u64 { 30 }
fn default_requests_per_second() -> u32 { 10 }
fn default_tickers_path() -> PathBuf { PathBuf::from("company-tickers.json") }
fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "filingforge".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__PASSWORD=...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file, still honouring APP__ overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }
}

impl DatabaseConfig {
    /// Build the connection URL. A missing credential is reported here so that it
    /// travels the same path as any other connection failure.
    pub fn connection_url(&self) -> Result<String, crate::errors::AppError> {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| crate::errors::AppError::DatabaseConnection {
                message: "storage credential APP__DATABASE__PASSWORD is not set".to_string(),
            })?;

        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, password, self.host, self.port, self.name
        ))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            username: default_db_username(),
            password: None,
            name: default_db_name(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            submissions_url: default_submissions_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_registry_timeout(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { tickers_path: default_tickers_path() }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self { output_dir: default_output_dir() }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            registry: RegistryConfig::default(),
            ingest: IngestConfig::default(),
            reports: ReportsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

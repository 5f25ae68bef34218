//! Configuration for the starmart service.
//!
//! Configuration is loaded from a YAML file (`starmart.yaml` by
//! convention); every section and field carries a serde default so a
//! missing or empty file yields a fully usable configuration. The
//! database URL can always be overridden through the `DATABASE_URL`
//! environment variable, which wins over the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete starmart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarmartConfig {
    /// Project name, used in server banners and the MCP handshake.
    #[serde(default)]
    pub project: Option<String>,

    /// Warehouse database connection.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Ad-hoc SQL guard limits.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Sample data generation settings.
    #[serde(default)]
    pub seed: SeedConfig,

    /// MCP server identity.
    #[serde(default)]
    pub mcp: McpConfig,
}

impl StarmartConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.is_empty()
        {
            self.database.url = url;
        }
    }
}

/// Warehouse database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pool connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "postgres://localhost:5432/starmart".to_string()
}

fn default_max_connections() -> u32 {
    5
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// The socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Limits applied by the ad-hoc SQL guard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Maximum accepted query text length, in characters.
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,

    /// Hard upper bound on rows returned by any ad-hoc query.
    #[serde(default = "default_hard_row_cap")]
    pub hard_row_cap: u64,

    /// Row limit used when the caller does not request one.
    #[serde(default = "default_row_limit")]
    pub default_row_limit: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_query_len: default_max_query_len(),
            hard_row_cap: default_hard_row_cap(),
            default_row_limit: default_row_limit(),
        }
    }
}

fn default_max_query_len() -> usize {
    2000
}

fn default_hard_row_cap() -> u64 {
    1000
}

fn default_row_limit() -> u64 {
    100
}

/// Sample data generation settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_customers")]
    pub customers: u32,

    #[serde(default = "default_seed_products")]
    pub products: u32,

    #[serde(default = "default_seed_sales")]
    pub sales: u32,

    /// Calendar year covered by the `dim_date` spine.
    #[serde(default = "default_seed_year")]
    pub year: i32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            customers: default_seed_customers(),
            products: default_seed_products(),
            sales: default_seed_sales(),
            year: default_seed_year(),
        }
    }
}

fn default_seed_customers() -> u32 {
    100
}

fn default_seed_products() -> u32 {
    50
}

fn default_seed_sales() -> u32 {
    1000
}

fn default_seed_year() -> i32 {
    2023
}

/// MCP server identity reported in the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_mcp_name")]
    pub name: String,

    #[serde(default = "default_mcp_version")]
    pub version: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            name: default_mcp_name(),
            version: default_mcp_version(),
        }
    }
}

fn default_mcp_name() -> String {
    "starmart".to_string()
}

fn default_mcp_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_warehouse_limits() {
        let config = StarmartConfig::default();
        assert_eq!(config.guard.max_query_len, 2000);
        assert_eq!(config.guard.hard_row_cap, 1000);
        assert_eq!(config.guard.default_row_limit, 100);
        assert_eq!(config.seed.customers, 100);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn parses_partial_yaml() {
        let yaml = r#"
project: demo-mart
server:
  port: 9100
guard:
  default_row_limit: 50
"#;
        let config: StarmartConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project.as_deref(), Some("demo-mart"));
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.guard.default_row_limit, 50);
        // Untouched sections keep their defaults.
        assert_eq!(config.guard.hard_row_cap, 1000);
        assert_eq!(config.seed.year, 2023);
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config: StarmartConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.mcp.name, "starmart");
    }
}

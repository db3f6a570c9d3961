use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base path of the backend REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout for the HTTP client.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted session ("token" and "user.json").
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Staleness window for driver lists and single drivers (default: 5 min).
    #[serde(default = "default_driver_ttl")]
    pub driver_ttl_seconds: u64,
    /// Staleness window for the vehicle-type catalog (default: 1 hour).
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_seconds: u64,
    /// Mark cached entries stale when the interface comes back to life.
    #[serde(default = "default_refresh_on_activity")]
    pub refresh_on_activity: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            driver_ttl_seconds: default_driver_ttl(),
            catalog_ttl_seconds: default_catalog_ttl(),
            refresh_on_activity: default_refresh_on_activity(),
        }
    }
}

fn default_driver_ttl() -> u64 {
    5 * 60
}

fn default_catalog_ttl() -> u64 {
    60 * 60
}

fn default_refresh_on_activity() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// Page size for the driver list (fixed per view).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Default sort, as `field,asc|desc`.
    #[serde(default = "default_sort")]
    pub sort: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            sort: default_sort(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_sort() -> String {
    "nome,asc".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backend_contract() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.cache.driver_ttl_seconds, 300);
        assert_eq!(config.cache.catalog_ttl_seconds, 3600);
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.listing.sort, "nome,asc");
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://frete.exemplo.com/api"

            [cache]
            driver_ttl_seconds = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://frete.exemplo.com/api");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.cache.driver_ttl_seconds, 60);
        assert_eq!(config.cache.catalog_ttl_seconds, 3600);
        assert!(config.cache.refresh_on_activity);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = Config::load(Path::new("/nonexistent/motorista-admin.toml")).unwrap();
        assert_eq!(config.listing.page_size, 10);
    }
}

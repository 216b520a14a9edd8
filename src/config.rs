use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheOptions;

pub const DEFAULT_BASE_URL: &str = "https://quickshop.co.il/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub device: DeviceConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Value of the `X-Platform` header
  #[serde(default = "default_platform_marker")]
  pub platform: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
      platform: default_platform_marker(),
    }
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

/// Identity reported to the server on login.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
  #[serde(default = "default_device_id")]
  pub id: String,
  /// "ios" or "android"
  #[serde(default = "default_device_platform")]
  pub platform: String,
}

impl Default for DeviceConfig {
  fn default() -> Self {
    Self {
      id: default_device_id(),
      platform: default_device_platform(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_query_retries")]
  pub query_retries: u32,
  #[serde(default = "default_mutation_retries")]
  pub mutation_retries: u32,
  #[serde(default = "default_retry_delay_ms")]
  pub retry_delay_ms: u64,
  /// Minutes an unused entry survives before eviction
  #[serde(default = "default_gc_minutes")]
  pub gc_minutes: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      query_retries: default_query_retries(),
      mutation_retries: default_mutation_retries(),
      retry_delay_ms: default_retry_delay_ms(),
      gc_minutes: default_gc_minutes(),
    }
  }
}

impl CacheConfig {
  pub fn options(&self) -> CacheOptions {
    CacheOptions {
      query_retries: self.query_retries,
      mutation_retries: self.mutation_retries,
      retry_delay: Duration::from_millis(self.retry_delay_ms),
      gc_time: Duration::from_secs(self.gc_minutes * 60),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default = "default_log_level")]
  pub level: String,
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_platform_marker() -> String {
  "mobile".to_string()
}

fn default_device_id() -> String {
  "unknown-device".to_string()
}

fn default_device_platform() -> String {
  "android".to_string()
}

fn default_query_retries() -> u32 {
  2
}

fn default_mutation_retries() -> u32 {
  1
}

fn default_retry_delay_ms() -> u64 {
  1000
}

fn default_gc_minutes() -> u64 {
  5
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./storefront.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storefront/config.yaml
  ///
  /// Falls back to built-in defaults when no file exists. `STOREFRONT_API_URL`
  /// overrides the configured base URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("STOREFRONT_API_URL") {
      if !url.trim().is_empty() {
        config.api.base_url = url;
      }
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("storefront.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("storefront").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Directory for rolling log files.
  pub fn log_directory(&self) -> Result<PathBuf> {
    if let Some(dir) = &self.log.directory {
      return Ok(dir.clone());
    }
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;
    Ok(data_dir.join("storefront").join("logs"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("{}").unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.timeout(), Duration::from_secs(30));
    assert_eq!(config.cache.query_retries, 2);
    assert_eq!(config.cache.mutation_retries, 1);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_partial_sections_keep_remaining_defaults() {
    let yaml = r#"
api:
  base_url: http://localhost:3000/api
cache:
  retry_delay_ms: 0
device:
  platform: ios
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.api.base_url, "http://localhost:3000/api");
    assert_eq!(config.api.platform, "mobile");
    assert_eq!(config.device.platform, "ios");
    assert_eq!(config.device.id, "unknown-device");

    let options = config.cache.options();
    assert_eq!(options.retry_delay, Duration::ZERO);
    assert_eq!(options.gc_time, Duration::from_secs(300));
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }
}

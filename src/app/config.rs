//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Classifier gateway settings
    pub gateway: GatewayConfig,
    /// Scan session settings
    pub scan: ScanConfig,
}

/// Classifier gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Classification service endpoint
    pub endpoint: String,
    /// Model to use for vision classification
    pub model: String,
    /// Max tokens for the classification response
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Scan session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum characters kept from a candidate label
    pub max_label_chars: usize,
    /// Path of the JSONL reward ledger file
    pub ledger_path: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-haiku-4-5-20250929".to_string(),
            max_tokens: 256,
            timeout_secs: 60,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_label_chars: 120,
            ledger_path: Config::data_dir().join("recycled_items.jsonl"),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.gateway.endpoint.starts_with("http://") && !self.gateway.endpoint.starts_with("https://") {
            return Err(crate::Error::Config(format!(
                "endpoint must be an http(s) URL, got {:?}", self.gateway.endpoint
            )));
        }
        if self.gateway.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if self.gateway.max_tokens == 0 {
            return Err(crate::Error::Config("max_tokens must be > 0".to_string()));
        }
        if !(1..=300).contains(&self.gateway.timeout_secs) {
            return Err(crate::Error::Config(format!(
                "timeout_secs must be in [1, 300], got {}", self.gateway.timeout_secs
            )));
        }
        if self.scan.max_label_chars == 0 {
            return Err(crate::Error::Config("max_label_chars must be > 0".to_string()));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Directory holding the config file and the CLI ledger
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".bottle_scan"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

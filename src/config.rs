//! Crate configuration: generation endpoint, model set, length limits.
//!
//! Loaded from a TOML file with environment overrides. A `.env` file is
//! honored via `dotenv` so local setups can keep the API key out of the
//! config file.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_API_URL: &str = "API_URL";
const ENV_API_KEY: &str = "API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("invalid prompt limits: min {min} exceeds max {max}")]
    InvalidLimits { min: usize, max: usize },
}

/// Connection settings for the completion endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EndpointConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/v1/completions".to_string(),
            api_key: String::new(),
            request_timeout_seconds: default_timeout(),
        }
    }
}

/// One model to register: display name plus the hub repo / endpoint model id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub repo: String,
}

/// Bounds on the requested output length, in tokens.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PromptLimits {
    pub min_length: usize,
    pub max_length: usize,
    pub default_length: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 200,
            default_length: 100,
        }
    }
}

impl PromptLimits {
    /// Clamp a requested length into the configured range.
    pub fn clamp(&self, requested: usize) -> usize {
        requested.clamp(self.min_length, self.max_length)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub limits: PromptLimits,
}

fn default_models() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "DistilGPT-2".to_string(),
            repo: "distilgpt2".to_string(),
        },
        ModelConfig {
            name: "GPT-Neo-125M".to_string(),
            repo: "EleutherAI/gpt-neo-125M".to_string(),
        },
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            models: default_models(),
            limits: PromptLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;
        let mut config: AppConfig = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path_str,
            reason: e.to_string(),
        })?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides; no config file required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        dotenv::dotenv().ok();
        if let Ok(url) = env::var(ENV_API_URL) {
            self.endpoint.api_url = url;
        }
        if let Ok(key) = env::var(ENV_API_KEY) {
            self.endpoint.api_key = key;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.min_length > self.limits.max_length {
            return Err(ConfigError::InvalidLimits {
                min: self.limits.min_length,
                max: self.limits.max_length,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_carry_the_stock_model_set() {
        let config = AppConfig::default();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].name, "DistilGPT-2");
        assert_eq!(config.models[0].repo, "distilgpt2");
        assert_eq!(config.models[1].repo, "EleutherAI/gpt-neo-125M");
        assert_eq!(config.limits.min_length, 50);
        assert_eq!(config.limits.max_length, 200);
    }

    #[test]
    fn limits_clamp_into_range() {
        let limits = PromptLimits::default();
        assert_eq!(limits.clamp(10), 50);
        assert_eq!(limits.clamp(100), 100);
        assert_eq!(limits.clamp(500), 200);
    }

    #[test]
    fn load_parses_models_and_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[models]]
name = "TinyGPT"
repo = "sshleifer/tiny-gpt2"

[limits]
min_length = 50
max_length = 150
default_length = 80
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.models[0].repo, "sshleifer/tiny-gpt2");
        assert_eq!(config.limits.max_length, 150);
        // Endpoint section omitted: defaults (or env) fill it in.
        assert!(!config.endpoint.api_url.is_empty());
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[limits]
min_length = 200
max_length = 100
default_length = 150
"#
        )
        .unwrap();

        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimits { .. }));
    }
}

//! Application configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a valid
//! configuration.

use crate::model::AUTHENTICATED_ROLE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Role a principal must carry to pass the route gate.
    pub authenticated_role: String,
    /// Capacity of the in-process backend's request channel.
    pub backend_buffer_size: usize,
    /// Prefix of short links and uploaded profile pictures.
    pub public_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            authenticated_role: AUTHENTICATED_ROLE.to_string(),
            backend_buffer_size: 32,
            public_base_url: "http://localhost:5173".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "backend_buffer_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads `path` if it exists, otherwise falls back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

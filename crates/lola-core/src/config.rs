//! Configuration types for the lola system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{ChunkOptions, RagSettings};

/// Main configuration for the lola client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LolaConfig {
    /// External RAG backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Default chunking options for imports.
    #[serde(default)]
    pub chunking: ChunkOptions,

    /// Default RAG settings (used until the store has a saved record).
    #[serde(default)]
    pub rag: RagSettings,
}

/// External backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the RAG/chat backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

// Default value functions

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_busy_timeout() -> u32 {
    30000
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lola")
        .join("lola.db")
}

impl LolaConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::LolaError::Config {
                message: format!("Failed to parse config: {}", e),
            }
        })?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lola").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("lola.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LolaConfig::default();
        assert_eq!(config.backend.base_url, "http://localhost:8000");
        assert_eq!(config.chunking.size, 1200);
        assert_eq!(config.rag.n_results, 3);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LolaConfig = toml::from_str(
            r#"
            [backend]
            base_url = "http://rag.internal:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.base_url, "http://rag.internal:9000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.chunking.overlap, 200);
    }
}

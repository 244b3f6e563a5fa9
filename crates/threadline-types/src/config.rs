//! Configuration types for Threadline.
//!
//! `ThreadlineConfig` represents the top-level `config.toml` loaded from
//! the data directory. All fields have defaults so an empty (or missing)
//! file yields a working configuration pointed at Groq's
//! OpenAI-compatible endpoint with a SQLite checkpoint store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadlineConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

/// Inference model and provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent to the provider.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Upper bound on a single inference call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model_name() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Checkpoint persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub backend: CheckpointBackend,
}

/// Which checkpoint store backs conversation persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// SQLite database in the data directory (survives restarts).
    #[default]
    Sqlite,
    /// One JSON document per thread in the data directory.
    File,
    /// Process-local only; state is lost on exit.
    Memory,
}

impl fmt::Display for CheckpointBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointBackend::Sqlite => write!(f, "sqlite"),
            CheckpointBackend::File => write!(f, "file"),
            CheckpointBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for CheckpointBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(CheckpointBackend::Sqlite),
            "file" => Ok(CheckpointBackend::File),
            "memory" => Ok(CheckpointBackend::Memory),
            other => Err(format!("invalid checkpoint backend: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: ThreadlineConfig = toml::from_str("").unwrap();
        assert_eq!(config.model.name, "llama-3.1-8b-instant");
        assert_eq!(config.model.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.model.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.model.timeout_secs, 60);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.checkpoint.backend, CheckpointBackend::Sqlite);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml_str = r#"
[model]
name = "llama-3.3-70b-versatile"
temperature = 0.2

[checkpoint]
backend = "file"
"#;
        let config: ThreadlineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.name, "llama-3.3-70b-versatile");
        assert_eq!(config.model.temperature, Some(0.2));
        // Untouched sections keep their defaults.
        assert_eq!(config.model.max_tokens, 1024);
        assert_eq!(config.checkpoint.backend, CheckpointBackend::File);
    }

    #[test]
    fn test_checkpoint_backend_roundtrip() {
        for backend in [
            CheckpointBackend::Sqlite,
            CheckpointBackend::File,
            CheckpointBackend::Memory,
        ] {
            let s = backend.to_string();
            let parsed: CheckpointBackend = s.parse().unwrap();
            assert_eq!(backend, parsed);
        }
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!("redis".parse::<CheckpointBackend>().is_err());
        let result: Result<ThreadlineConfig, _> =
            toml::from_str("[checkpoint]\nbackend = \"redis\"\n");
        assert!(result.is_err());
    }
}

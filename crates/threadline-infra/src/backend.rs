//! Data directory resolution, config loading, and backend construction.
//!
//! Wires configuration to concrete implementations: the checkpoint
//! backend named in `config.toml` becomes a [`BoxCheckpointer`] the
//! rest of the system uses through the trait alone.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use threadline_core::checkpoint::BoxCheckpointer;
use threadline_types::config::{CheckpointBackend, ThreadlineConfig};

use crate::file::JsonFileCheckpointer;
use crate::memory::MemoryCheckpointer;
use crate::sqlite::{DatabasePool, SqliteCheckpointer};

/// Resolve the data directory: `THREADLINE_DATA_DIR` env var, falling
/// back to `~/.threadline`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("THREADLINE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".threadline")
}

/// Load `config.toml` from the data directory.
///
/// A missing file yields the default configuration; a present but
/// malformed file is an error (silently ignoring a typo'd config is
/// worse than refusing to start).
pub fn load_config(data_dir: &Path) -> anyhow::Result<ThreadlineConfig> {
    let path = data_dir.join("config.toml");
    if !path.exists() {
        return Ok(ThreadlineConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config = toml::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Construct the configured checkpoint backend.
pub async fn build_checkpointer(
    backend: CheckpointBackend,
    data_dir: &Path,
) -> anyhow::Result<BoxCheckpointer> {
    info!(%backend, "initializing checkpoint store");
    match backend {
        CheckpointBackend::Sqlite => {
            tokio::fs::create_dir_all(data_dir).await?;
            let url = format!(
                "sqlite://{}?mode=rwc",
                data_dir.join("threadline.db").display()
            );
            let pool = DatabasePool::new(&url)
                .await
                .context("opening sqlite checkpoint store")?;
            Ok(BoxCheckpointer::new(SqliteCheckpointer::new(pool)))
        }
        CheckpointBackend::File => Ok(BoxCheckpointer::new(JsonFileCheckpointer::new(
            data_dir.join("threads"),
        ))),
        CheckpointBackend::Memory => Ok(BoxCheckpointer::new(MemoryCheckpointer::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadline_core::checkpoint::Checkpointer;
    use threadline_types::thread::ConversationState;

    #[test]
    fn test_missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.checkpoint.backend, CheckpointBackend::Sqlite);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[model\nbroken").unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[checkpoint]\nbackend = \"memory\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.checkpoint.backend, CheckpointBackend::Memory);
    }

    #[tokio::test]
    async fn test_build_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        for backend in [
            CheckpointBackend::Sqlite,
            CheckpointBackend::File,
            CheckpointBackend::Memory,
        ] {
            let store = build_checkpointer(backend, dir.path()).await.unwrap();
            let state = ConversationState::new("smoke".parse().unwrap());
            store.save(&state).await.unwrap();
            assert!(store
                .load(&"smoke".parse().unwrap())
                .await
                .unwrap()
                .is_some());
        }
    }
}

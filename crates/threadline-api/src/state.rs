//! Application state wiring all services together.
//!
//! `AppState` holds the concrete turn service used by both CLI and REST
//! API. The service is generic over the checkpointer and model
//! contracts, but AppState pins them to the concrete infra
//! implementations chosen from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use threadline_core::checkpoint::BoxCheckpointer;
use threadline_core::registry::ThreadRegistry;
use threadline_core::turn::{TurnOptions, TurnService};
use threadline_infra::backend::{build_checkpointer, load_config, resolve_data_dir};
use threadline_infra::model::config::{api_key_from_env, ProviderConfig};
use threadline_infra::model::OpenAiCompatibleModel;
use threadline_types::config::ThreadlineConfig;

/// Concrete type alias for the turn service pinned to infra implementations.
pub type ConcreteTurnService = TurnService<BoxCheckpointer, OpenAiCompatibleModel>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub turns: Arc<ConcreteTurnService>,
    pub config: ThreadlineConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, open the
    /// checkpoint store, rebuild the registry, wire the model client.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_config(&data_dir)?;

        let checkpointer = build_checkpointer(config.checkpoint.backend, &data_dir).await?;

        // Restore known threads so listing works before any traffic.
        let registry = Arc::new(ThreadRegistry::new());
        let restored = registry
            .hydrate(&checkpointer)
            .await
            .context("failed to hydrate thread registry from checkpoint store")?;
        tracing::debug!(restored, backend = %config.checkpoint.backend, "registry ready");

        let api_key = api_key_from_env(&config.model.api_key_env).with_context(|| {
            format!(
                "no API key found: set the {} environment variable \
                 (get one at https://console.groq.com/keys)",
                config.model.api_key_env
            )
        })?;

        let model = OpenAiCompatibleModel::new(ProviderConfig {
            provider_name: "groq".into(),
            base_url: config.model.base_url.clone(),
            api_key,
            model: config.model.name.clone(),
        });

        let turns = TurnService::new(
            registry,
            checkpointer,
            model,
            TurnOptions::from(&config.model),
        );

        Ok(Self {
            turns: Arc::new(turns),
            config,
            data_dir,
        })
    }
}

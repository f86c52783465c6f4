//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use tapcard_core::{CardService, CardStore, Locator, MemoryStore, SqliteStore};

use crate::config::{Config, IN_MEMORY_DB};

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Card lifecycle operations.
    pub cards: Arc<CardService>,

    /// Application configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the configured store and build the card service.
    ///
    /// Creates the upload directory if it does not exist yet.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn CardStore> = if config.db_path == IN_MEMORY_DB {
            tracing::warn!("using in-memory card store; cards will not survive a restart");
            Arc::new(MemoryStore::new())
        } else {
            Arc::new(
                SqliteStore::open(&config.db_path)
                    .with_context(|| format!("failed to open card database {}", config.db_path))?,
            )
        };

        std::fs::create_dir_all(&config.upload_dir).with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

        Ok(Self::with_store(config, store))
    }

    /// Build state around an existing store.
    pub fn with_store(config: Config, store: Arc<dyn CardStore>) -> Self {
        let mut locator = Locator::new(config.base_origin.clone());
        if let Some(capacity) = config.nfc_capacity {
            locator = locator.with_nfc_capacity(capacity);
        }

        tracing::info!(
            base_origin = %locator.base_origin(),
            nfc_capacity = ?config.nfc_capacity,
            "application state initialized"
        );

        Self {
            cards: Arc::new(CardService::new(store, locator)),
            config: Arc::new(config),
        }
    }
}

//! Shared application state.

use crate::auth::{JwtVerifier, TokenVerifier};
use crate::config::ServerConfig;
use crate::relay::Relay;
use crate::store::{FileShapeStore, MemoryShapeStore, ShapeStore, StoreError};
use std::sync::Arc;

/// Injected into handlers through the `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn ShapeStore>) -> Self {
        Self {
            relay: Arc::new(Relay::new(store, config.auto_create_rooms)),
            verifier: Arc::new(JwtVerifier::new(&config.jwt_secret)),
            config: Arc::new(config),
        }
    }

    /// Build state with the store selected by `config.data_dir`.
    pub async fn from_config(config: ServerConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn ShapeStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileShapeStore::open(dir).await?),
            None => {
                tracing::warn!("SKETCHROOM_DATA_DIR not set, shapes are kept in memory");
                Arc::new(MemoryShapeStore::new())
            }
        };
        Ok(Self::new(config, store))
    }
}

use std::sync::Arc;

use tracing::{error, info};

use crate::{
    config::{Config, StoreKind},
    database::connection::establish_pooled_connection,
    error::AppError,
    media::MediaStore,
    store::{memory::MemoryStore, pg::PgStore, Store},
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub media: MediaStore,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let media = MediaStore::new(config.media_root.clone(), config.media_url.clone());
        Self {
            config,
            store,
            media,
        }
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let store: Arc<dyn Store> = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| AppError::Internal("DATABASE_URL must be set".to_string()))?;
                let pool = establish_pooled_connection(url, config.pool_size)
                    .map_err(|e| AppError::Internal(format!("Failed to build pool: {e}")))?;
                info!("Using PostgreSQL store");
                Arc::new(PgStore::new(pool))
            }
            StoreKind::Memory => {
                info!("Using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, store))
    }

    /// Runs blocking store work off the async executor.
    pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T, AppError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| {
                error!("Store task failed: {e}");
                AppError::Internal(e.to_string())
            })?
    }
}

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        Self::from_config(AppConfig::from_env()?).await
    }

    /// Connects, applies migrations and prepares the upload directory.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let db = db::connect(&config.database_url, config.db_max_connections).await?;
        db::migrate(&db).await?;

        let storage = Arc::new(
            LocalStorage::new(&config.upload_dir, &config.static_url_prefix).await?,
        ) as Arc<dyn StorageClient>;

        tracing::info!(
            database = %config.database_url,
            upload_dir = %config.upload_dir.display(),
            "state initialized"
        );
        Ok(Self::from_parts(db, Arc::new(config), storage))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }
}

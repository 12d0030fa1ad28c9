use std::sync::Arc;

use crate::auth::{jwt::JwtKeys, repo::PgUserRepo, repo::UserRepo};
use crate::config::AppConfig;
use crate::db;
use crate::storage::{LocalStorage, StorageClient};
use crate::tasks::repo::{PgTaskRepo, TaskRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub tasks: Arc<dyn TaskRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;

        let storage = Arc::new(
            LocalStorage::new(&config.storage.upload_dir, &config.storage.public_prefix).await?,
        ) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgTaskRepo::new(pool)),
            storage,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        tasks: Arc<dyn TaskRepo>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            config,
            keys,
            users,
            tasks,
            storage,
        }
    }
}

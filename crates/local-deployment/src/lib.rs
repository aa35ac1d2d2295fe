use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{config::Config, overdue::OverdueSweeper, photos::PhotoStore};
use tokio::sync::OnceCell;
use tracing::info;

/// Single-machine deployment: SQLite file and photos under the data directory.
#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    photo_store: PhotoStore,
    sweeper: Arc<OnceCell<()>>,
}

impl LocalDeployment {
    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let db = DBService::new(&config.database_url).await?;
        Ok(Self::with_db(config, db))
    }

    /// Wraps an already opened database, e.g. an in-memory one in tests.
    pub fn with_db(config: Config, db: DBService) -> Self {
        let photo_store = PhotoStore::new(config.photos_dir(), config.max_photo_bytes);
        Self {
            config: Arc::new(config),
            db,
            photo_store,
            sweeper: Arc::new(OnceCell::new()),
        }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        Self::from_config(Config::from_env()).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn photo_store(&self) -> &PhotoStore {
        &self.photo_store
    }

    async fn spawn_background_tasks(&self) {
        self.sweeper
            .get_or_init(|| async {
                info!(
                    data_dir = %self.config.data_dir.display(),
                    "Spawning background tasks"
                );
                OverdueSweeper::spawn(self.db.clone(), self.config.sweep_interval);
            })
            .await;
    }
}

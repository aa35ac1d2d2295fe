use async_trait::async_trait;
use db::DBService;
use services::services::{
    config::Config,
    database_validator::{DatabaseValidationError, DatabaseValidator},
    photos::PhotoStore,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Validation(#[from] DatabaseValidationError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Everything a running instance hands to the HTTP layer.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn photo_store(&self) -> &PhotoStore;

    /// Starts background work. Called once after construction.
    async fn spawn_background_tasks(&self);

    /// Logs the migration state; a broken schema is reported, not fatal.
    async fn validate_database(&self) -> Result<(), DeploymentError> {
        let result = DatabaseValidator::new(self.db().pool.clone()).validate().await?;
        if result.is_ok() {
            info!("{}", result.summary());
        } else {
            warn!("{}", result.summary());
        }
        Ok(())
    }
}

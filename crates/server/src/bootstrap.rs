use std::sync::Arc;

use leadflow_core::assignment::AssignmentRouter;
use leadflow_core::config::{AppConfig, ConfigError, LoadOptions};
use leadflow_db::repositories::{
    SqlAuditLogRepository, SqlLeadRepository, SqlOrderLinkRepository,
};
use leadflow_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::quotes::{DisabledQuoteDrafter, HttpQuoteDrafter, QuoteDrafter};
use crate::service::LeadService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}

impl Application {
    /// Wire the lead service against the SQL repositories and the configured
    /// quote-drafting collaborator.
    pub fn lead_service(&self) -> Result<LeadService, ConfigError> {
        let drafter: Arc<dyn QuoteDrafter> =
            match HttpQuoteDrafter::from_config(&self.config.quotes) {
                Some(drafter) => Arc::new(drafter),
                None => Arc::new(DisabledQuoteDrafter),
            };

        Ok(LeadService::new(
            Arc::new(SqlLeadRepository::new(self.db_pool.clone())),
            Arc::new(SqlAuditLogRepository::new(self.db_pool.clone())),
            Arc::new(SqlOrderLinkRepository::new(self.db_pool.clone())),
            drafter,
            AssignmentRouter::new(self.config.assignment.auto_assign_to.clone()),
            self.config.sla.policy_set()?,
        ))
    }
}

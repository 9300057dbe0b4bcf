use std::sync::Arc;

use axum::Router;
use clientele_core::config::{AppConfig, ConfigError, LoadOptions};
use clientele_db::{connect, migrations, DbPool, SqlCustomerRepository};
use thiserror::Error;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::avatar::HttpAvatarSource;
use crate::service::CustomerService;
use crate::{customers, health};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub customers: CustomerService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("avatar client construction failed: {0}")]
    AvatarClient(#[source] reqwest::Error),
}

impl Application {
    /// Every route, wrapped in a per-request tracing span.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(customers::router(self.customers.clone()))
            .merge(health::router(self.db_pool.clone()))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let avatars =
        HttpAvatarSource::from_config(&config.avatar).map_err(BootstrapError::AvatarClient)?;
    info!(
        event_name = "system.bootstrap.avatar_client_ready",
        base_url = %config.avatar.base_url,
        timeout_secs = config.avatar.timeout_secs,
        "avatar client configured"
    );

    let customers = CustomerService::new(
        Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        Arc::new(avatars),
    );

    Ok(Application { config, db_pool, customers })
}

//! Subcommand implementations.

pub mod migrate;
pub mod order;
pub mod seed;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use snaplist_api::config::{ConfigError, load_database_url};

/// Connect to the database named by `SNAPLIST_DATABASE_URL` / `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = load_database_url()?;

    tracing::info!("Connecting to database...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}

/// Errors shared by all commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Failed(String),
}

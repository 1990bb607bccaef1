//! Database migration command.
//!
//! Applies `crates/api/migrations/` to the database named by
//! `SNAPLIST_DATABASE_URL` (or `DATABASE_URL`). The session table is created
//! by the API server itself at startup.

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

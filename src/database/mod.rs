/// Database modules organized by feature
mod burger;
mod migrations;
mod roulette;
mod tasks;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

pub use burger::TransferReason;

/// Database connection pool wrapper
///
/// Handles all database operations for the bot: the scheduled-task table
/// plus the burger transfer and roulette round logs.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection and run migrations
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        info!("Database connected and migrations completed");
        Ok(db)
    }

    /// Get a reference to the connection pool (for internal use)
    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

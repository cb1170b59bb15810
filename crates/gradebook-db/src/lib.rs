//! # Gradebook DB
//!
//! Connection pool, embedded migrations and [`PgGradebookStore`], the
//! Postgres implementation of the grading engine's store traits.
//!
//! ```ignore
//! let config = DatabaseConfig::from_env()?;
//! let pool = init_db_pool(&config).await?;
//! run_migrations(&pool).await?;
//! ```

mod store;

use gradebook_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;
pub use store::PgGradebookStore;

/// Opens a pool against `DATABASE_URL`.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    info!(
        max_connections = config.max_connections,
        "Database pool initialized"
    );
    Ok(pool)
}

/// Applies the migrations embedded from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// PostgreSQL connection management
///
/// - `pool`: pool construction, liveness probe, shutdown
/// - `migrations`: embedded schema migrations from the workspace
///   `migrations/` directory
///
/// Row mapping and queries live in `store::postgres`.
///
/// # Example
///
/// ```no_run
/// use smarttask_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;

/// Schema migrations
///
/// SQL files under the workspace `migrations/` directory are embedded at
/// compile time and applied in version order. Applied versions are
/// recorded in sqlx's `_sqlx_migrations` table, so running them again is a
/// no-op.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("../migrations");
    info!(available = migrator.iter().count(), "Running database migrations");

    migrator.run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_migrations_are_embedded_in_order() {
        let migrator = sqlx::migrate!("../migrations");
        let versions: Vec<i64> = migrator.iter().map(|m| m.version).collect();

        assert_eq!(versions.len(), 2);
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }
}

//! Schema migrations.
//!
//! Scripts are read at runtime from a directory of `<version>_<name>.sql`
//! files. Applied versions are recorded by sqlx in `_sqlx_migrations`, so a
//! second run against an up-to-date database does nothing.

use std::path::Path;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::{error, info};

/// Applies every pending script in `dir`, in version order.
///
/// Stops at the first failing script; nothing is rolled back or retried.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), MigrateError> {
    let migrator = Migrator::new(dir).await.map_err(|err| {
        error!(dir = %dir.display(), error = %err, "cannot load migrations");
        err
    })?;

    let latest = migrator.iter().map(|m| m.version).max();
    info!(dir = %dir.display(), ?latest, "applying migrations");

    migrator.run(pool).await.map_err(|err| {
        error!(error = %err, "migration failed");
        err
    })?;

    info!(?latest, "schema up to date");
    Ok(())
}

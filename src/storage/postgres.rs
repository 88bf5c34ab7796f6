//! Postgres implementation of [`UsersStorage`].

use std::path::Path;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::migrations::run_migrations;
use super::{StorageError, UsersStorage};
use crate::config::Config;
use crate::context::Context;
use crate::models::User;

/// SQLSTATE `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgUsersStorage {
    pool: PgPool,
    log: Span,
}

impl PgUsersStorage {
    /// Opens the pool and brings the schema up to date.
    ///
    /// The adapter is only handed out once every migration has been applied,
    /// so no query can run against an old schema.
    pub async fn connect(config: &Config, log: Span) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .map_err(StorageError::Connect)?;

        Self::migrated(pool, &config.migrations_dir, log).await
    }

    /// Applies the scripts in `migrations_dir` to `pool`, then wraps it.
    pub async fn migrated(
        pool: PgPool,
        migrations_dir: &Path,
        log: Span,
    ) -> Result<Self, StorageError> {
        run_migrations(&pool, migrations_dir)
            .instrument(log.clone())
            .await?;

        Ok(Self::new(pool, log))
    }

    /// Wraps a pool whose schema is already migrated.
    pub fn new(pool: PgPool, log: Span) -> Self {
        Self { pool, log }
    }

    /// Closes the pool. Queries still in flight may fail.
    pub async fn close(&self) {
        self.pool.close().await;
        self.log.in_scope(|| info!("database pool closed"));
    }

    fn op_span(&self, op: &'static str) -> Span {
        info_span!(parent: &self.log, "call", op = op)
    }
}

fn ensure_live(ctx: &Context) -> Result<(), StorageError> {
    if ctx.is_cancelled() {
        warn!("context cancelled before query");
        return Err(StorageError::Cancelled);
    }
    Ok(())
}

fn is_unique_violation(code: Option<&str>) -> bool {
    code == Some(UNIQUE_VIOLATION)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::RowNotFound => return StorageError::NotFound,
        sqlx::Error::Database(db) if is_unique_violation(db.code().as_deref()) => {
            return StorageError::AlreadyExists;
        }
        _ => {}
    }
    error!(error = %err, "database operation failed");
    StorageError::Unexpected(err)
}

#[async_trait]
impl UsersStorage for PgUsersStorage {
    async fn get_users(&self, ctx: &Context) -> Result<Vec<User>, StorageError> {
        async {
            ensure_live(ctx)?;

            let mut rows = sqlx::query("SELECT id, login, password FROM users").fetch(&self.pool);
            let mut users = Vec::new();
            while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
                // An undecodable row is dropped; the rest of the listing is still served.
                match User::from_row(&row) {
                    Ok(user) => users.push(user),
                    Err(err) => warn!(error = %err, "skipping user row that failed to decode"),
                }
            }
            Ok::<_, StorageError>(users)
        }
        .instrument(self.op_span("storage.get_users"))
        .await
    }

    async fn get_user_by_id(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError> {
        async {
            ensure_live(ctx)?;

            sqlx::query_as::<_, User>("SELECT id, login, password FROM users WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)
        }
        .instrument(self.op_span("storage.get_user_by_id"))
        .await
    }

    async fn insert_user(&self, ctx: &Context, user: User) -> Result<User, StorageError> {
        async {
            ensure_live(ctx)?;

            sqlx::query_as::<_, User>(
                "INSERT INTO users (id, login, password) VALUES ($1, $2, $3)
                 RETURNING id, login, password",
            )
            .bind(user.id)
            .bind(&user.login)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
        }
        .instrument(self.op_span("storage.insert_user"))
        .await
    }

    async fn update_user(
        &self,
        ctx: &Context,
        id: Uuid,
        user: User,
    ) -> Result<User, StorageError> {
        async {
            ensure_live(ctx)?;

            // The key comes from the caller's id; `user.id` is never written.
            sqlx::query_as::<_, User>(
                "UPDATE users SET login = $2, password = $3 WHERE id = $1
                 RETURNING id, login, password",
            )
            .bind(id)
            .bind(&user.login)
            .bind(&user.password)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StorageError::NotFound)
        }
        .instrument(self.op_span("storage.update_user"))
        .await
    }

    async fn delete_user(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError> {
        async {
            ensure_live(ctx)?;

            sqlx::query_as::<_, User>(
                "DELETE FROM users WHERE id = $1 RETURNING id, login, password",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StorageError::NotFound)
        }
        .instrument(self.op_span("storage.delete_user"))
        .await
    }
}

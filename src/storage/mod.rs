//! Persistence port for users and its adapters.
//!
//! [`UsersStorage`] is the capability the domain service depends on. The
//! Postgres adapter lives in [`postgres`]; it is the only place that looks at
//! driver error codes.

pub mod migrations;
pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::Context;
use crate::models::User;

pub use postgres::PgUsersStorage;

/// Failures reported by a [`UsersStorage`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No row matches the given id.
    #[error("user not found")]
    NotFound,

    /// A unique column (`id` or `login`) already holds the value.
    #[error("user already exists")]
    AlreadyExists,

    /// The caller's context was cancelled before the query was issued.
    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("unexpected storage error: {0}")]
    Unexpected(#[source] sqlx::Error),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait UsersStorage: Send + Sync {
    /// All users. Rows that cannot be decoded are logged and left out.
    async fn get_users(&self, ctx: &Context) -> Result<Vec<User>, StorageError>;

    async fn get_user_by_id(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError>;

    async fn insert_user(&self, ctx: &Context, user: User) -> Result<User, StorageError>;

    /// Replaces every column of the row keyed by `id` with `user`.
    async fn update_user(&self, ctx: &Context, id: Uuid, user: User)
        -> Result<User, StorageError>;

    /// Removes the row and returns it as it was just before deletion.
    async fn delete_user(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError>;
}

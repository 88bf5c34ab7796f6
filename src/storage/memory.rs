//! In-memory [`UsersStorage`] used by service and router tests.
//!
//! Keeps the same contract as the Postgres adapter: `id` and `login` are
//! unique, missing ids are `NotFound`, a cancelled context fails fast.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StorageError, UsersStorage};
use crate::context::Context;
use crate::models::User;

#[derive(Default)]
pub(crate) struct MemoryUsersStorage {
    rows: Mutex<BTreeMap<Uuid, User>>,
}

fn ensure_live(ctx: &Context) -> Result<(), StorageError> {
    if ctx.is_cancelled() {
        return Err(StorageError::Cancelled);
    }
    Ok(())
}

fn login_taken(rows: &BTreeMap<Uuid, User>, login: &str, except: Option<Uuid>) -> bool {
    rows.values()
        .any(|u| u.login == login && Some(u.id) != except)
}

#[async_trait]
impl UsersStorage for MemoryUsersStorage {
    async fn get_users(&self, ctx: &Context) -> Result<Vec<User>, StorageError> {
        ensure_live(ctx)?;
        Ok(self.rows.lock().await.values().cloned().collect())
    }

    async fn get_user_by_id(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError> {
        ensure_live(ctx)?;
        self.rows
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn insert_user(&self, ctx: &Context, user: User) -> Result<User, StorageError> {
        ensure_live(ctx)?;
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&user.id) || login_taken(&rows, &user.login, None) {
            return Err(StorageError::AlreadyExists);
        }
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        ctx: &Context,
        id: Uuid,
        user: User,
    ) -> Result<User, StorageError> {
        ensure_live(ctx)?;
        let mut rows = self.rows.lock().await;
        if !rows.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        if login_taken(&rows, &user.login, Some(id)) {
            return Err(StorageError::AlreadyExists);
        }
        let replaced = User { id, ..user };
        rows.insert(id, replaced.clone());
        Ok(replaced)
    }

    async fn delete_user(&self, ctx: &Context, id: Uuid) -> Result<User, StorageError> {
        ensure_live(ctx)?;
        self.rows
            .lock()
            .await
            .remove(&id)
            .ok_or(StorageError::NotFound)
    }
}

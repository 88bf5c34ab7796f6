// src/services/users.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info_span, Instrument, Span};
use uuid::Uuid;

use crate::context::Context;
use crate::models::User;
use crate::storage::{StorageError, UsersStorage};

/// Errors in the service's own vocabulary.
///
/// `NotFound` and `AlreadyExists` are relabelled storage conditions; anything
/// else is carried unchanged under `Storage` with the failing operation name.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{op}: user not found")]
    NotFound { op: &'static str },

    #[error("{op}: user already exists")]
    AlreadyExists { op: &'static str },

    #[error("{op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: StorageError,
    },
}

#[async_trait]
pub trait UsersService: Send + Sync {
    async fn get_users(&self, ctx: &Context) -> Result<Vec<User>, ServiceError>;
    async fn get_user_by_id(&self, ctx: &Context, id: Uuid) -> Result<User, ServiceError>;
    async fn insert_user(&self, ctx: &Context, user: User) -> Result<User, ServiceError>;
    async fn update_user(&self, ctx: &Context, id: Uuid, user: User)
        -> Result<User, ServiceError>;
    async fn delete_user(&self, ctx: &Context, id: Uuid) -> Result<User, ServiceError>;
}

/// Forwards every call to a [`UsersStorage`] and translates its errors.
pub struct Users {
    storage: Arc<dyn UsersStorage>,
    log: Span,
}

impl Users {
    pub fn new(storage: Arc<dyn UsersStorage>, log: Span) -> Self {
        Self { storage, log }
    }

    fn op_span(&self, op: &'static str) -> Span {
        info_span!(parent: &self.log, "call", op = op)
    }
}

fn relabel(op: &'static str, err: StorageError) -> ServiceError {
    match err {
        StorageError::NotFound => {
            debug!(op, "storage reported not found");
            ServiceError::NotFound { op }
        }
        StorageError::AlreadyExists => {
            debug!(op, "storage reported duplicate");
            ServiceError::AlreadyExists { op }
        }
        source => {
            error!(op, error = %source, "storage call failed");
            ServiceError::Storage { op, source }
        }
    }
}

#[async_trait]
impl UsersService for Users {
    async fn get_users(&self, ctx: &Context) -> Result<Vec<User>, ServiceError> {
        const OP: &str = "service.get_users";
        self.storage
            .get_users(ctx)
            .instrument(self.op_span(OP))
            .await
            .map_err(|err| relabel(OP, err))
    }

    async fn get_user_by_id(&self, ctx: &Context, id: Uuid) -> Result<User, ServiceError> {
        const OP: &str = "service.get_user_by_id";
        self.storage
            .get_user_by_id(ctx, id)
            .instrument(self.op_span(OP))
            .await
            .map_err(|err| relabel(OP, err))
    }

    async fn insert_user(&self, ctx: &Context, user: User) -> Result<User, ServiceError> {
        const OP: &str = "service.insert_user";
        self.storage
            .insert_user(ctx, user)
            .instrument(self.op_span(OP))
            .await
            .map_err(|err| relabel(OP, err))
    }

    async fn update_user(
        &self,
        ctx: &Context,
        id: Uuid,
        user: User,
    ) -> Result<User, ServiceError> {
        const OP: &str = "service.update_user";
        self.storage
            .update_user(ctx, id, user)
            .instrument(self.op_span(OP))
            .await
            .map_err(|err| relabel(OP, err))
    }

    async fn delete_user(&self, ctx: &Context, id: Uuid) -> Result<User, ServiceError> {
        const OP: &str = "service.delete_user";
        self.storage
            .delete_user(ctx, id)
            .instrument(self.op_span(OP))
            .await
            .map_err(|err| relabel(OP, err))
    }
}

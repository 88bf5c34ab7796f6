// src/routes/users.rs
use axum::{
    body::Bytes,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{context::Context, models::User, services::ServiceError, state::AppState};

/// JSON body for successful responses.
///
/// Serialization happens before anything is written, so a failure here can
/// still be reported as a clean 500.
fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "Error writing response body");
            plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Error writing response body")
        }
    }
}

fn plain_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, message.into()).into_response()
}

fn parse_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|e| {
        warn!(id = raw, error = %e, "id must be a UUID");
        plain_error(StatusCode::BAD_REQUEST, e.to_string())
    })
}

fn parse_user(body: &[u8]) -> Result<User, Response> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "request body is not a user");
        plain_error(StatusCode::BAD_REQUEST, format!("Invalid user body: {}", e))
    })
}

/// Status and plain-text body for a failed service call.
fn service_failure(err: ServiceError, action: &str) -> Response {
    match err {
        ServiceError::NotFound { .. } => {
            warn!(error = %err, "no user with this id");
            plain_error(StatusCode::NOT_FOUND, "User not found")
        }
        ServiceError::AlreadyExists { .. } => {
            warn!(error = %err, "user already exists");
            plain_error(StatusCode::CONFLICT, "User already exists")
        }
        ServiceError::Storage { .. } => {
            error!(error = %err, "Error {}", action);
            plain_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error {}", action),
            )
        }
    }
}

// GET /api/v1/users
#[instrument(parent = &state.log, name = "call", skip_all, fields(op = "controller.list_users"))]
pub async fn list_users(Extension(state): Extension<Arc<AppState>>) -> Response {
    let (ctx, _cancel_on_drop) = Context::new();

    match state.users.get_users(&ctx).await {
        Ok(users) => json_response(StatusCode::OK, &users),
        // An empty store is not a client error.
        Err(err @ ServiceError::NotFound { .. }) => {
            warn!(error = %err, "no users in storage");
            json_response(StatusCode::OK, &Vec::<User>::new())
        }
        Err(err) => service_failure(err, "fetching users"),
    }
}

// GET /api/v1/users/{id}
#[instrument(parent = &state.log, name = "call", skip_all, fields(op = "controller.get_user"))]
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (ctx, _cancel_on_drop) = Context::new();

    match state.users.get_user_by_id(&ctx, id).await {
        Ok(user) => json_response(StatusCode::OK, &user),
        Err(err) => service_failure(err, "fetching user"),
    }
}

// POST /api/v1/users
#[instrument(parent = &state.log, name = "call", skip_all, fields(op = "controller.create_user"))]
pub async fn create_user(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    let user = match parse_user(&body) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let (ctx, _cancel_on_drop) = Context::new();

    match state.users.insert_user(&ctx, user).await {
        Ok(created) => json_response(StatusCode::CREATED, &created),
        Err(err) => service_failure(err, "creating user"),
    }
}

// PUT /api/v1/users/{id}
#[instrument(parent = &state.log, name = "call", skip_all, fields(op = "controller.replace_user"))]
pub async fn replace_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let user = match parse_user(&body) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let (ctx, _cancel_on_drop) = Context::new();

    match state.users.update_user(&ctx, id, user).await {
        Ok(updated) => json_response(StatusCode::OK, &updated),
        Err(err) => service_failure(err, "updating user"),
    }
}

// DELETE /api/v1/users/{id}
#[instrument(parent = &state.log, name = "call", skip_all, fields(op = "controller.delete_user"))]
pub async fn delete_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (ctx, _cancel_on_drop) = Context::new();

    match state.users.delete_user(&ctx, id).await {
        Ok(deleted) => json_response(StatusCode::OK, &deleted),
        Err(err) => service_failure(err, "deleting user"),
    }
}

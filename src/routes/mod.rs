// src/routes/mod.rs
pub mod health;
pub mod users;

use axum::{routing::get, Router};

/// Routes below `/api`. Handlers expect an `Extension<Arc<AppState>>` layer.
pub fn create_router() -> Router {
    Router::new()
        .route("/v1/health-check", get(health::health_check))
        .route(
            "/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/v1/users/:id",
            get(users::get_user)
                .put(users::replace_user)
                .delete(users::delete_user),
        )
}

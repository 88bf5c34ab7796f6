// src/models/user.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row of the `users` table, also the JSON shape of the API.
///
/// The password is stored exactly as supplied; nothing hashes it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password: String,
}

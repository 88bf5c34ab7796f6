// src/services/mod.rs
pub mod users;

pub use users::{ServiceError, Users, UsersService};

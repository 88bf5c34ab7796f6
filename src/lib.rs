//! HTTP CRUD service for a single `User` resource backed by Postgres.
//!
//! Requests flow through three layers, each with its own error vocabulary:
//! [`routes`] (status codes) → [`services`] (`ServiceError`) →
//! [`storage`] (`StorageError`, the only layer that reads driver codes).

pub mod app;
pub mod config;
pub mod context;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

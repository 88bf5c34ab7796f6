// src/state.rs
use std::sync::Arc;
use tracing::Span;

use crate::services::UsersService;

/// Shared with every handler through `Extension<Arc<AppState>>`.
pub struct AppState {
    pub users: Arc<dyn UsersService>,
    /// Parent span for controller log entries.
    pub log: Span,
}

//! Shared application state for all routes. Read-only after startup.

use crate::db::ConnectionManager;
use crate::engine::Registry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub db: Arc<ConnectionManager>,
}

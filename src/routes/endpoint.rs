//! Routes for configured endpoints. One path segment; the handler resolves it in the registry.

use crate::handlers::dispatch;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn endpoint_routes(state: AppState) -> Router {
    Router::new()
        .route("/:endpoint", get(dispatch).post(dispatch).put(dispatch).delete(dispatch))
        .with_state(state)
}

mod common;
mod endpoint;

pub use common::common_routes;
pub use endpoint::endpoint_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// The full gateway: common routes plus every configured endpoint, bodies capped at `max_body_bytes`.
pub fn gateway_routes(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(endpoint_routes(state))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

//! Common routes: heartbeat and generated documentation.

use crate::docs;
use crate::error::AppError;
use crate::extractors::BasicAuth;
use crate::state::AppState;
use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HeartbeatBody {
    version: String,
}

async fn heartbeat(State(state): State<AppState>) -> Json<HeartbeatBody> {
    Json(HeartbeatBody {
        version: state.registry.version().to_string(),
    })
}

async fn help(BasicAuth(credentials): BasicAuth, State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let credentials = credentials.ok_or(AppError::Unauthenticated)?;
    if !state.registry.authenticate(&credentials.username, &credentials.password) {
        return Err(AppError::Unauthenticated);
    }
    let docs = docs::generate(&state.registry, &state.db).await;
    Ok(Html(docs::render_html(state.registry.version(), &docs)))
}

/// GET /heartbeat (unauthenticated) and GET /help.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/help", get(help))
        .with_state(state)
}

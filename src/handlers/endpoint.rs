//! Dispatch for configured endpoints: authenticate, route, authorize, execute.

use crate::engine::HttpVerb;
use crate::error::AppError;
use crate::extractors::BasicAuth;
use crate::response::Reply;
use crate::sql::text_value;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, Method},
};
use serde_json::{Map, Value};

fn text_params<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Map<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), text_value(v))).collect()
}

/// Headers that carry caller secrets. Never bound or logged as parameters.
fn is_secret(name: &HeaderName) -> bool {
    *name == header::AUTHORIZATION || *name == header::PROXY_AUTHORIZATION || *name == header::COOKIE
}

fn header_params(headers: &HeaderMap) -> Map<String, Value> {
    text_params(
        headers
            .iter()
            .filter(|(name, _)| !is_secret(name))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
    )
}

fn parse_body(bytes: &Bytes) -> Result<Option<Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))
}

pub async fn dispatch(
    BasicAuth(credentials): BasicAuth,
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Reply, AppError> {
    let credentials = credentials.ok_or(AppError::Unauthenticated)?;
    if !state.registry.authenticate(&credentials.username, &credentials.password) {
        return Err(AppError::Unauthenticated);
    }
    let verb = HttpVerb::from_method(&method).ok_or_else(|| AppError::MethodNotAllowed(format!("{} /{}", method, path)))?;
    tracing::debug!(verb = %verb, path = %path, args = ?query, "received request");

    let endpoint = state
        .registry
        .lookup(&path)
        .ok_or_else(|| AppError::NotFound(path.clone()))?;
    if !endpoint.is_authorized(verb, &credentials.username) {
        tracing::warn!(username = %credentials.username, verb = %verb, path = %endpoint.path(), "caller not permitted");
        return Err(AppError::Unauthorized(format!("{} /{}", verb, endpoint.path())));
    }

    let body = parse_body(&body)?;
    let path_params = text_params(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    let header_params = header_params(&headers);
    endpoint
        .execute(verb, &state.db, &path_params, body.as_ref(), &header_params)
        .await
}

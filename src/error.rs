//! Typed errors and HTTP mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup-time configuration failures. The process must not start when one is raised.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing REST endpoint path")]
    EmptyPath,
    #[error("invalid endpoint path: {0}")]
    InvalidPath(String),
    #[error("duplicate endpoint path: {0}")]
    DuplicatePath(String),
    #[error("endpoint {path} already has a {verb} query")]
    DuplicateVerb { path: String, verb: String },
    #[error("invalid query template for {context}: {reason}")]
    InvalidTemplate { context: String, reason: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Statement-level failures, caught at the connection manager boundary.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("reconnect failed: {0}")]
    Reconnect(sqlx::Error),
    #[error("query timed out after {0} seconds")]
    Timeout(u64),
    #[error("missing parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("could not verify your account")]
    Unauthenticated,
    #[error("could not verify your permissions for {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no query configured for {0}")]
    MethodNotAllowed(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

const BASIC_CHALLENGE: &str = "Basic realm=\"Login Required\"";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, BASIC_CHALLENGE)], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}

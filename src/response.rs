//! Result shaping and the `{status, data}` response envelope.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// One row keyed by column name, columns in result order.
pub type Record = Map<String, Value>;
pub type ResultSet = Vec<Record>;

pub const NO_CACHE: &str = "no-cache, no-store, no-transform, max-age=0";

/// Zip each row positionally against `columns`. Row order is kept; extra values without a
/// column name are dropped.
pub fn shape(columns: &[String], rows: Vec<Vec<Value>>) -> ResultSet {
    rows.into_iter()
        .map(|row| columns.iter().cloned().zip(row).collect::<Record>())
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    pub status: String,
    pub data: Option<ResultSet>,
}

/// An engine response: HTTP status plus envelope. Always served uncacheable.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status_code: StatusCode,
    pub envelope: Envelope,
}

impl Reply {
    pub fn new(status: impl Into<String>, status_code: StatusCode, data: Option<ResultSet>) -> Self {
        Reply {
            status_code,
            envelope: Envelope {
                status: status.into(),
                data,
            },
        }
    }

    pub fn success(data: Option<ResultSet>) -> Self {
        Reply::new("success", StatusCode::OK, data)
    }

    pub fn failure() -> Self {
        Reply::new("failure", StatusCode::INTERNAL_SERVER_ERROR, None)
    }

    pub fn rejected() -> Self {
        Reply::new("failure", StatusCode::BAD_REQUEST, None)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (
            self.status_code,
            [(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE))],
            Json(self.envelope),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shapes_rows_in_order() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![vec![json!(1), json!("a")], vec![json!(2), json!("b")]];
        let shaped = shape(&columns, rows);
        assert_eq!(
            serde_json::to_string(&shaped).unwrap(),
            r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#
        );
    }

    #[test]
    fn column_order_is_preserved_not_sorted() {
        let columns = vec!["zeta".to_string(), "alpha".to_string()];
        let shaped = shape(&columns, vec![vec![json!(true), json!(null)]]);
        let keys: Vec<_> = shaped[0].keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn envelope_serializes_null_data() {
        let reply = Reply::failure();
        assert_eq!(reply.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::to_value(&reply.envelope).unwrap(),
            json!({ "status": "failure", "data": null })
        );
    }

    #[test]
    fn replies_disable_caching() {
        let resp = Reply::success(None).into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), NO_CACHE);
    }
}

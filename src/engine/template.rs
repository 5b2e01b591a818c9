//! One verb's query declaration with its derived parameter contract.

use crate::config::{EventHookConfig, VerbConfig};
use crate::sql::{compile_placeholders, CompiledSql, PlaceholderError};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Response returned instead of the generic envelope when a query succeeds without rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyResponse {
    pub status: String,
    pub status_code: StatusCode,
}

#[derive(Clone, Debug)]
pub struct QueryTemplate {
    sql_text: String,
    compiled: CompiledSql,
    default_parameter_values: Map<String, Value>,
    allowed_callers: HashSet<String>,
    should_commit: bool,
    description: String,
    empty_response: Option<EmptyResponse>,
    event_hooks: Vec<EventHookConfig>,
}

impl QueryTemplate {
    /// Scan `sql` for placeholders. Other fields take their defaults.
    pub fn new<I, S>(sql: &str, allowed_callers: I) -> Result<Self, PlaceholderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let compiled = compile_placeholders(sql)?;
        let default_parameter_values = compiled
            .names
            .iter()
            .map(|name| (name.clone(), Value::String("NULL".into())))
            .collect();
        Ok(QueryTemplate {
            sql_text: sql.to_string(),
            compiled,
            default_parameter_values,
            allowed_callers: allowed_callers.into_iter().map(Into::into).collect(),
            should_commit: false,
            description: "Not provided.".into(),
            empty_response: None,
            event_hooks: Vec::new(),
        })
    }

    pub fn from_config(decl: &VerbConfig) -> Result<Self, PlaceholderError> {
        let mut template = QueryTemplate::new(&decl.query, decl.users.iter().cloned())?;
        template.should_commit = decl.commit;
        template.description = decl.description.clone();
        // status codes are checked by the config validator
        template.empty_response = decl.empty_response.as_ref().and_then(|e| {
            StatusCode::from_u16(e.status_code).ok().map(|status_code| EmptyResponse {
                status: e.status.clone(),
                status_code,
            })
        });
        template.event_hooks = decl.pusher_events.clone();
        Ok(template)
    }

    pub fn with_empty_response(mut self, empty: EmptyResponse) -> Self {
        self.empty_response = Some(empty);
        self
    }

    /// True iff `caller` is non-empty and on the allow-list.
    pub fn is_authorized(&self, caller: &str) -> bool {
        !caller.is_empty() && self.allowed_callers.contains(caller)
    }

    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    pub fn compiled(&self) -> &CompiledSql {
        &self.compiled
    }

    /// Placeholder names, unique, in first-occurrence order.
    pub fn required_parameters(&self) -> &[String] {
        &self.compiled.names
    }

    /// Every required parameter mapped to the literal `NULL`. For documentation only.
    pub fn default_parameter_values(&self) -> &Map<String, Value> {
        &self.default_parameter_values
    }

    pub fn allowed_callers(&self) -> &HashSet<String> {
        &self.allowed_callers
    }

    pub fn should_commit(&self) -> bool {
        self.should_commit
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn empty_response(&self) -> Option<&EmptyResponse> {
        self.empty_response.as_ref()
    }

    pub fn event_hooks(&self) -> &[EventHookConfig] {
        &self.event_hooks
    }
}

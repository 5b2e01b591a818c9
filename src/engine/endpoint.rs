//! A REST path grouping up to four verb queries.

use crate::db::ConnectionManager;
use crate::engine::{HttpVerb, ParameterSet, QueryTemplate};
use crate::error::{AppError, ConfigError, ExecError};
use crate::response::{Reply, ResultSet};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Lower-cased path without surrounding slashes.
pub fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_lowercase()
}

#[derive(Clone, Debug)]
pub struct Endpoint {
    path: String,
    verbs: BTreeMap<HttpVerb, QueryTemplate>,
}

impl Endpoint {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let path = normalize_path(path);
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        Ok(Endpoint {
            path,
            verbs: BTreeMap::new(),
        })
    }

    /// Attach the query for `verb`. Each verb can be bound once.
    pub fn add_verb(&mut self, verb: HttpVerb, template: QueryTemplate) -> Result<(), ConfigError> {
        if self.verbs.contains_key(&verb) {
            return Err(ConfigError::DuplicateVerb {
                path: self.path.clone(),
                verb: verb.to_string(),
            });
        }
        self.verbs.insert(verb, template);
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn template(&self, verb: HttpVerb) -> Option<&QueryTemplate> {
        self.verbs.get(&verb)
    }

    pub fn verbs(&self) -> impl Iterator<Item = (HttpVerb, &QueryTemplate)> {
        self.verbs.iter().map(|(v, t)| (*v, t))
    }

    /// False when `verb` is not configured here, or `caller` is not on its allow-list.
    pub fn is_authorized(&self, verb: HttpVerb, caller: &str) -> bool {
        self.template(verb).is_some_and(|t| t.is_authorized(caller))
    }

    /// Run the query bound to `verb`. A JSON array body on POST runs as one batch with a
    /// parameter set per element. Statement failures become a 500 envelope.
    pub async fn execute(
        &self,
        verb: HttpVerb,
        db: &ConnectionManager,
        path_params: &Map<String, Value>,
        body: Option<&Value>,
        headers: &Map<String, Value>,
    ) -> Result<Reply, AppError> {
        let template = self
            .template(verb)
            .ok_or_else(|| AppError::MethodNotAllowed(format!("{} /{}", verb, self.path)))?;
        let sql = template.compiled();

        let outcome = match body {
            Some(Value::Array(items)) if verb == HttpVerb::Post => {
                let mut batch = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Object(fields) = item else {
                        return Err(AppError::BadRequest("bulk body items must be JSON objects".into()));
                    };
                    batch.push(ParameterSet::merge(path_params, Some(fields), headers));
                }
                if let Some(reply) = self.reject_missing(verb, template, &batch) {
                    return Ok(reply);
                }
                db.execute_batch(sql, &batch, template.should_commit()).await.map(|_| None)
            }
            Some(Value::Object(fields)) => {
                let params = ParameterSet::merge(path_params, Some(fields), headers);
                if let Some(reply) = self.reject_missing(verb, template, std::slice::from_ref(&params)) {
                    return Ok(reply);
                }
                db.execute(sql, &params, template.should_commit()).await
            }
            None | Some(Value::Null) => {
                let params = ParameterSet::merge(path_params, None, headers);
                if let Some(reply) = self.reject_missing(verb, template, std::slice::from_ref(&params)) {
                    return Ok(reply);
                }
                db.execute(sql, &params, template.should_commit()).await
            }
            Some(_) => return Err(AppError::BadRequest("body must be a JSON object".into())),
        };

        Ok(respond(template, outcome))
    }

    fn reject_missing(&self, verb: HttpVerb, template: &QueryTemplate, sets: &[ParameterSet]) -> Option<Reply> {
        let missing: Vec<String> = sets
            .iter()
            .flat_map(|p| p.missing(template.required_parameters()))
            .fold(Vec::new(), |mut acc, name| {
                if !acc.contains(&name) {
                    acc.push(name);
                }
                acc
            });
        if missing.is_empty() {
            return None;
        }
        tracing::warn!(path = %self.path, verb = %verb, missing = ?missing, "request is missing query parameters");
        Some(Reply::rejected())
    }
}

fn respond(template: &QueryTemplate, outcome: Result<Option<ResultSet>, ExecError>) -> Reply {
    match outcome {
        Ok(None) => match template.empty_response() {
            Some(empty) => Reply::new(empty.status.clone(), empty.status_code, None),
            None => Reply::success(None),
        },
        Ok(Some(records)) => Reply::success(Some(records)),
        Err(ExecError::MissingParameters(_)) => Reply::rejected(),
        Err(_) => Reply::failure(),
    }
}

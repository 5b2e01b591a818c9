//! Registry: endpoints and callers compiled from the configuration document.
//! Built once at startup and read-only afterwards.

use crate::config::{validate, GatewayConfig};
use crate::engine::{normalize_path, CredentialStore, Endpoint, HttpVerb, QueryTemplate};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Registry {
    endpoints: HashMap<String, Endpoint>,
    credentials: CredentialStore,
    version: String,
}

impl Registry {
    /// Validate `config` and compile every endpoint and caller. Any failure is fatal.
    pub fn build(config: &GatewayConfig) -> Result<Self, ConfigError> {
        validate(config)?;

        let mut credentials = CredentialStore::new();
        for user in &config.users {
            credentials.register(&user.username, &user.password);
        }

        let mut endpoints = HashMap::new();
        for decl in &config.endpoints {
            let mut endpoint = Endpoint::new(&decl.path)?;
            for (name, verb_decl) in decl.verbs() {
                let verb = HttpVerb::from_str(name).map_err(ConfigError::Validation)?;
                let template = QueryTemplate::from_config(verb_decl).map_err(|e| ConfigError::InvalidTemplate {
                    context: format!("{} /{}", verb, endpoint.path()),
                    reason: e.to_string(),
                })?;
                endpoint.add_verb(verb, template)?;
            }
            tracing::info!(path = %endpoint.path(), verbs = ?endpoint.verbs().map(|(v, _)| v).collect::<Vec<_>>(), "adding endpoint");
            if endpoints.contains_key(endpoint.path()) {
                return Err(ConfigError::DuplicatePath(endpoint.path().to_string()));
            }
            endpoints.insert(endpoint.path().to_string(), endpoint);
        }

        Ok(Registry {
            endpoints,
            credentials,
            version: config.version.clone(),
        })
    }

    /// Endpoint for `path`, matched case-insensitively. A miss is logged.
    pub fn lookup(&self, path: &str) -> Option<&Endpoint> {
        let found = self.endpoints.get(&normalize_path(path));
        if found.is_none() {
            tracing::warn!(path = %path, "unable to respond to request: unknown endpoint");
        }
        found
    }

    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.credentials.authenticate(username, password)
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// All endpoints ordered by path.
    pub fn endpoints(&self) -> Vec<&Endpoint> {
        let mut all: Vec<_> = self.endpoints.values().collect();
        all.sort_by(|a, b| a.path().cmp(b.path()));
        all
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

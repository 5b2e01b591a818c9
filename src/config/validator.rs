//! Config validation: structural checks that must fail the process at startup.

use crate::config::GatewayConfig;
use crate::engine::normalize_path;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9_\-]+$").expect("static pattern"))
}

pub fn validate(config: &GatewayConfig) -> Result<(), ConfigError> {
    if config.database_pool_size == 0 {
        return Err(ConfigError::Validation("database_pool_size must be at least 1".into()));
    }
    if config.query_timeout_secs == 0 {
        return Err(ConfigError::Validation("query_timeout_secs must be at least 1".into()));
    }

    let mut paths = HashSet::new();
    for endpoint in &config.endpoints {
        let path = normalize_path(&endpoint.path);
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if path == "heartbeat" || path == "help" || !path_pattern().is_match(&path) {
            return Err(ConfigError::InvalidPath(endpoint.path.clone()));
        }
        if !paths.insert(path.clone()) {
            return Err(ConfigError::DuplicatePath(path));
        }

        for (verb, decl) in endpoint.verbs() {
            let context = format!("{} /{}", verb.to_uppercase(), path);
            if decl.query.trim().is_empty() {
                return Err(ConfigError::InvalidTemplate {
                    context,
                    reason: "query is empty".into(),
                });
            }
            if decl.users.iter().any(|u| u.trim().is_empty()) {
                return Err(ConfigError::Validation(format!("{}: empty caller name in users", context)));
            }
            if let Some(empty) = &decl.empty_response {
                if axum::http::StatusCode::from_u16(empty.status_code).is_err() {
                    return Err(ConfigError::Validation(format!(
                        "{}: emptyResponse.statusCode {} is not an HTTP status",
                        context, empty.status_code
                    )));
                }
            }
            for hook in &decl.pusher_events {
                if hook.channel.is_empty() || hook.event_name.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "{}: pusherEvents entries need channel and eventName",
                        context
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmptyResponseConfig, EndpointConfig, VerbConfig};

    fn verb(query: &str) -> VerbConfig {
        VerbConfig {
            users: vec!["alice".into()],
            query: query.into(),
            description: "Not provided.".into(),
            commit: false,
            empty_response: None,
            pusher_events: Vec::new(),
        }
    }

    fn config(endpoints: Vec<EndpointConfig>) -> GatewayConfig {
        GatewayConfig {
            database_ip_address: "127.0.0.1".into(),
            database_port: 5432,
            database: "shop".into(),
            database_user: "gw".into(),
            database_password: "pw".into(),
            database_pool_size: 2,
            version: "1".into(),
            query_timeout_secs: 30,
            max_body_bytes: 1024,
            users: Vec::new(),
            endpoints,
        }
    }

    fn endpoint(path: &str) -> EndpointConfig {
        EndpointConfig {
            path: path.into(),
            get: Some(verb("SELECT 1")),
            post: None,
            put: None,
            delete: None,
        }
    }

    #[test]
    fn accepts_well_formed_config() {
        validate(&config(vec![endpoint("/Widgets"), endpoint("gadgets")])).unwrap();
    }

    #[test]
    fn rejects_empty_path() {
        let err = validate(&config(vec![endpoint("/")])).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPath));
    }

    #[test]
    fn rejects_duplicate_path_case_insensitively() {
        let err = validate(&config(vec![endpoint("widgets"), endpoint("WIDGETS")])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePath(p) if p == "widgets"));
    }

    #[test]
    fn rejects_nested_and_reserved_paths() {
        assert!(matches!(
            validate(&config(vec![endpoint("a/b")])).unwrap_err(),
            ConfigError::InvalidPath(_)
        ));
        assert!(matches!(
            validate(&config(vec![endpoint("heartbeat")])).unwrap_err(),
            ConfigError::InvalidPath(_)
        ));
    }

    #[test]
    fn rejects_empty_query() {
        let mut ep = endpoint("widgets");
        ep.get = Some(verb("   "));
        let err = validate(&config(vec![ep])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
    }

    #[test]
    fn rejects_bad_empty_response_code() {
        let mut ep = endpoint("widgets");
        let mut v = verb("SELECT 1");
        v.empty_response = Some(EmptyResponseConfig {
            status: "none".into(),
            status_code: 42,
        });
        ep.get = Some(v);
        let err = validate(&config(vec![ep])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}

//! Endpoint documentation derived from the registry and column metadata.

use crate::config::EventHookConfig;
use crate::db::{ColumnMeta, ConnectionManager};
use crate::engine::{HttpVerb, Registry};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Serialize)]
pub struct VerbDoc {
    pub verb: HttpVerb,
    pub path: String,
    pub description: String,
    pub parameters: Vec<String>,
    pub example_parameters: Map<String, Value>,
    pub callers: Vec<String>,
    pub commit: bool,
    pub events: Vec<EventHookConfig>,
    /// Response columns for GET queries. `None` when not described or describing failed.
    pub columns: Option<Vec<ColumnMeta>>,
}

/// Document every configured verb. GET queries are described against the database.
pub async fn generate(registry: &Registry, db: &ConnectionManager) -> Vec<VerbDoc> {
    let mut docs = Vec::new();
    for endpoint in registry.endpoints() {
        for (verb, template) in endpoint.verbs() {
            let columns = if verb == HttpVerb::Get {
                match db.column_info(template.compiled()).await {
                    Ok(cols) => Some(cols),
                    Err(e) => {
                        tracing::warn!(path = %endpoint.path(), error = %e, "unable to describe query");
                        None
                    }
                }
            } else {
                None
            };
            let mut callers: Vec<String> = template.allowed_callers().iter().cloned().collect();
            callers.sort();
            docs.push(VerbDoc {
                verb,
                path: format!("/{}", endpoint.path()),
                description: template.description().to_string(),
                parameters: template.required_parameters().to_vec(),
                example_parameters: template.default_parameter_values().clone(),
                callers,
                commit: template.should_commit(),
                events: template.event_hooks().to_vec(),
                columns,
            });
        }
    }
    docs
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn parameter_list(parameters: &[String]) -> String {
    if parameters.is_empty() {
        return "None<br/><br/>".into();
    }
    let items: String = parameters.iter().map(|p| format!("<li>{}</li>\n", escape(p))).collect();
    format!("<ul>\n{}</ul>\n", items)
}

fn column_list(columns: &Option<Vec<ColumnMeta>>) -> String {
    match columns {
        None => "unavailable".into(),
        Some(cols) if cols.is_empty() => "None".into(),
        Some(cols) => {
            let fields: Vec<String> = cols
                .iter()
                .map(|c| format!("&nbsp;\"{}\": {}", escape(&c.name), escape(&c.type_name)))
                .collect();
            format!("{{<br/>{}<br/>}}", fields.join(",<br/>"))
        }
    }
}

/// Render the documentation as a standalone HTML page.
pub fn render_html(version: &str, docs: &[VerbDoc]) -> String {
    let mut sections = String::new();
    for doc in docs {
        sections.push_str(&format!(
            "<h3>{} {}</h3><div>\n<p><b>Description</b><br/>{}<br/><br/><b>Parameters</b><br/>{}<b>Callers</b><br/>{}<br/><br/>",
            doc.verb,
            escape(&doc.path),
            escape(&doc.description),
            parameter_list(&doc.parameters),
            escape(&doc.callers.join(", ")),
        ));
        if doc.verb == HttpVerb::Get {
            sections.push_str(&format!("<b>Response Body</b><br/>{}", column_list(&doc.columns)));
        }
        if !doc.events.is_empty() {
            let events: Vec<String> = doc
                .events
                .iter()
                .map(|e| format!("{}:{}", escape(&e.channel), escape(&e.event_name)))
                .collect();
            sections.push_str(&format!("<br/><br/><b>Events</b><br/>{}", events.join(", ")));
        }
        sections.push_str("</p></div>\n");
    }
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>API {}</title></head>\n<body>\n<h2>API version {}</h2>\n{}</body></html>\n",
        escape(version),
        escape(version),
        sections
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(verb: HttpVerb, columns: Option<Vec<ColumnMeta>>) -> VerbDoc {
        VerbDoc {
            verb,
            path: "/widgets".into(),
            description: "List <widgets>".into(),
            parameters: vec!["ID".into()],
            example_parameters: Map::new(),
            callers: vec!["alice".into()],
            commit: false,
            events: Vec::new(),
            columns,
        }
    }

    #[test]
    fn renders_columns_for_get() {
        let cols = vec![
            ColumnMeta { name: "id".into(), type_name: "INT4".into() },
            ColumnMeta { name: "name".into(), type_name: "TEXT".into() },
        ];
        let html = render_html("1.0", &[doc(HttpVerb::Get, Some(cols))]);
        assert!(html.contains("<h3>GET /widgets</h3>"));
        assert!(html.contains("List &lt;widgets&gt;"));
        assert!(html.contains("<li>ID</li>"));
        assert!(html.contains("&nbsp;\"id\": INT4,<br/>&nbsp;\"name\": TEXT"));
    }

    #[test]
    fn describe_failure_renders_unavailable() {
        let html = render_html("1.0", &[doc(HttpVerb::Get, None)]);
        assert!(html.contains("Response Body</b><br/>unavailable"));
        let post = render_html("1.0", &[doc(HttpVerb::Post, None)]);
        assert!(!post.contains("Response Body"));
    }

    #[test]
    fn no_parameters_renders_none() {
        assert_eq!(parameter_list(&[]), "None<br/><br/>");
    }
}

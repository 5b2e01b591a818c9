//! Raw config types matching the gateway's JSON configuration document.

use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    5432
}

fn default_pool_size() -> u32 {
    5
}

fn default_query_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_description() -> String {
    "Not provided.".into()
}

/// Top-level configuration document. Unknown keys are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub database_ip_address: String,
    #[serde(default = "default_port")]
    pub database_port: u16,
    pub database: String,
    pub database_user: String,
    pub database_password: String,
    #[serde(default = "default_pool_size")]
    pub database_pool_size: u32,
    pub version: String,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub path: String,
    #[serde(default)]
    pub get: Option<VerbConfig>,
    #[serde(default)]
    pub post: Option<VerbConfig>,
    #[serde(default)]
    pub put: Option<VerbConfig>,
    #[serde(default)]
    pub delete: Option<VerbConfig>,
}

impl EndpointConfig {
    /// Configured verbs in GET, POST, PUT, DELETE order.
    pub fn verbs(&self) -> impl Iterator<Item = (&'static str, &VerbConfig)> {
        [
            ("get", self.get.as_ref()),
            ("post", self.post.as_ref()),
            ("put", self.put.as_ref()),
            ("delete", self.delete.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerbConfig {
    /// Caller names allowed to run this verb.
    pub users: Vec<String>,
    pub query: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub commit: bool,
    #[serde(default, rename = "emptyResponse")]
    pub empty_response: Option<EmptyResponseConfig>,
    #[serde(default, rename = "pusherEvents")]
    pub pusher_events: Vec<EventHookConfig>,
}

/// Status and code returned when a query succeeds without rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponseConfig {
    pub status: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHookConfig {
    pub channel: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(default)]
    pub message: String,
}

//! Read the configuration document from disk or a string.

use crate::config::{validate, GatewayConfig};
use crate::error::ConfigError;
use std::path::Path;

/// Parse and validate a configuration document.
pub fn parse_config(raw: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse and validate the configuration file at `path`.
pub async fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "reading config file");
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_config(&raw)
}

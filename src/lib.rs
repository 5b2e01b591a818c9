//! SQL Gateway: configuration-driven REST gateway over PostgreSQL query templates.

pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;

pub use config::{load_config, parse_config, GatewayConfig};
pub use db::{ConnectionManager, Connector, Connection, PgConnector};
pub use engine::{CredentialStore, Endpoint, HttpVerb, ParameterSet, QueryTemplate, Registry};
pub use error::{AppError, ConfigError, ExecError};
pub use response::{shape, Reply, ResultSet};
pub use routes::{common_routes, endpoint_routes, gateway_routes};
pub use state::AppState;

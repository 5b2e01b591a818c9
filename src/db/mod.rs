//! Database access: the connection manager and its PostgreSQL backend.

mod connection;
pub mod postgres;

pub use connection::*;
pub use postgres::{PgConnector, PgHandle};

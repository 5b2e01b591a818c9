//! Connection manager: liveness check before every call, transparent reconnect, timed execution.

use crate::engine::ParameterSet;
use crate::error::ExecError;
use crate::response::{shape, ResultSet};
use crate::sql::{CompiledSql, PgBindValue};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Column names once, then every row's values in column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Column name and the database's type name for it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

/// One live database handle.
#[async_trait]
pub trait Connection: Send + Sync {
    /// True when the handle can still reach the database.
    async fn is_live(&self) -> bool;
    async fn query(&self, sql: &str, params: &[PgBindValue], commit: bool) -> Result<RawRows, sqlx::Error>;
    /// Runs `sql` once per parameter row. Returns total rows affected.
    async fn query_batch(&self, sql: &str, batch: &[Vec<PgBindValue>], commit: bool) -> Result<u64, sqlx::Error>;
    /// Column metadata for `sql` without running it.
    async fn describe(&self, sql: &str) -> Result<Vec<ColumnMeta>, sqlx::Error>;
    async fn close(&self);
}

/// Opens handles with fixed host, credentials and pool settings.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Connection>, sqlx::Error>;
}

pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    current: RwLock<Arc<dyn Connection>>,
    query_timeout: Duration,
}

impl ConnectionManager {
    /// Open the first handle. Fails if the database is unreachable at startup.
    pub async fn connect<C>(connector: C, query_timeout: Duration) -> Result<Self, sqlx::Error>
    where
        C: Connector + 'static,
    {
        let first = connector.connect().await?;
        Ok(ConnectionManager {
            connector: Box::new(connector),
            current: RwLock::new(first),
            query_timeout,
        })
    }

    /// Current handle, replaced first if it is no longer live. The stale handle is closed
    /// in the background once the new one is in place.
    async fn checkout(&self) -> Result<Arc<dyn Connection>, ExecError> {
        let conn = self.current.read().await.clone();
        if conn.is_live().await {
            return Ok(conn);
        }
        let (fresh, stale) = {
            let mut guard = self.current.write().await;
            // another task may have reconnected while we waited for the lock
            if guard.is_live().await {
                return Ok(guard.clone());
            }
            tracing::warn!("database connection is not live; reconnecting");
            let fresh = self.connector.connect().await.map_err(|e| {
                tracing::error!(error = %e, "reconnect failed");
                ExecError::Reconnect(e)
            })?;
            let stale = std::mem::replace(&mut *guard, fresh.clone());
            (fresh, stale)
        };
        tracing::info!("database connection re-established");
        tokio::spawn(async move { stale.close().await });
        Ok(fresh)
    }

    async fn timed<T, F>(&self, fut: F) -> Result<T, ExecError>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(ExecError::Db),
            Err(_) => Err(ExecError::Timeout(self.query_timeout.as_secs())),
        }
    }

    /// Run one statement. `Ok(None)` means it succeeded without returning rows.
    pub async fn execute(
        &self,
        sql: &CompiledSql,
        params: &ParameterSet,
        commit: bool,
    ) -> Result<Option<ResultSet>, ExecError> {
        let conn = self.checkout().await?;
        let binds = bind_values(sql, params)?;
        tracing::debug!(query = %sql.positional, parameters = ?params, "executing query");
        let res = self.timed(conn.query(&sql.positional, &binds, commit)).await;
        match res {
            Ok(raw) => {
                tracing::debug!(columns = ?raw.columns, rows = raw.rows.len(), "query returned");
                let records = shape(&raw.columns, raw.rows);
                if records.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(records))
                }
            }
            Err(e) => {
                tracing::error!(query = %sql.positional, parameters = ?params, error = %e, "query operation failed");
                Err(e)
            }
        }
    }

    /// Run one statement per parameter set as a single batch.
    pub async fn execute_batch(
        &self,
        sql: &CompiledSql,
        batch: &[ParameterSet],
        commit: bool,
    ) -> Result<(), ExecError> {
        let conn = self.checkout().await?;
        let binds = batch
            .iter()
            .map(|params| bind_values(sql, params))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(query = %sql.positional, parameters = ?batch, "executing batch");
        match self.timed(conn.query_batch(&sql.positional, &binds, commit)).await {
            Ok(affected) => {
                tracing::debug!(affected, "batch complete");
                Ok(())
            }
            Err(e) => {
                tracing::error!(query = %sql.positional, parameters = ?batch, error = %e, "batch operation failed");
                Err(e)
            }
        }
    }

    pub async fn column_info(&self, sql: &CompiledSql) -> Result<Vec<ColumnMeta>, ExecError> {
        let conn = self.checkout().await?;
        tracing::debug!(query = %sql.positional, "describing query");
        self.timed(conn.describe(&sql.positional)).await
    }

    pub async fn shutdown(&self) {
        self.current.read().await.close().await;
    }
}

/// Values for `$1..$n` in order. Fails listing every name the set does not supply.
pub fn bind_values(sql: &CompiledSql, params: &ParameterSet) -> Result<Vec<PgBindValue>, ExecError> {
    let missing = params.missing(&sql.names);
    if !missing.is_empty() {
        return Err(ExecError::MissingParameters(missing));
    }
    Ok(sql
        .names
        .iter()
        .map(|name| params.get(name).map(PgBindValue::from_json).unwrap_or(PgBindValue::Null))
        .collect())
}

//! PostgreSQL handle backed by a `PgPool`.

use crate::config::GatewayConfig;
use crate::db::{ColumnMeta, Connection, Connector, RawRows};
use crate::sql::PgBindValue;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sqlx::postgres::{types::Oid, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Connection as _, Executor, Row, TypeInfo};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub struct PgConnector {
    options: PgConnectOptions,
    pool_size: u32,
    database: String,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions, pool_size: u32) -> Self {
        let database = options.get_database().unwrap_or_default().to_string();
        PgConnector {
            options,
            pool_size,
            database,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.database_ip_address)
            .port(config.database_port)
            .database(&config.database)
            .username(&config.database_user)
            .password(&config.database_password);
        PgConnector::new(options, config.database_pool_size)
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<Arc<dyn Connection>, sqlx::Error> {
        tracing::info!(database = %self.database, pool_size = self.pool_size, "connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(self.pool_size)
            .acquire_timeout(Duration::from_secs(10))
            .test_before_acquire(true)
            .connect_with(self.options.clone())
            .await?;
        Ok(Arc::new(PgHandle { pool }))
    }
}

pub struct PgHandle {
    pool: PgPool,
}

#[async_trait]
impl Connection for PgHandle {
    /// A closed pool or a failed ping on an idle connection means dead. A pool with no idle
    /// connection counts as live; checkouts are verified by `test_before_acquire`.
    async fn is_live(&self) -> bool {
        if self.pool.is_closed() {
            return false;
        }
        let Some(mut conn) = self.pool.try_acquire() else {
            return true;
        };
        match conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "liveness ping failed");
                false
            }
        }
    }

    async fn query(&self, sql: &str, params: &[PgBindValue], commit: bool) -> Result<RawRows, sqlx::Error> {
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p.clone());
        }
        let rows = if commit {
            let mut tx = self.pool.begin().await?;
            let rows = query.fetch_all(&mut *tx).await?;
            tracing::debug!("committing transaction");
            tx.commit().await?;
            rows
        } else {
            query.fetch_all(&self.pool).await?
        };
        Ok(rows_to_raw(&rows))
    }

    async fn query_batch(&self, sql: &str, batch: &[Vec<PgBindValue>], commit: bool) -> Result<u64, sqlx::Error> {
        let mut affected = 0;
        if commit {
            let mut tx = self.pool.begin().await?;
            for params in batch {
                affected += bind_all(sql, params).execute(&mut *tx).await?.rows_affected();
            }
            tx.commit().await?;
        } else {
            let mut conn = self.pool.acquire().await?;
            for params in batch {
                affected += bind_all(sql, params).execute(&mut *conn).await?.rows_affected();
            }
        }
        Ok(affected)
    }

    async fn describe(&self, sql: &str) -> Result<Vec<ColumnMeta>, sqlx::Error> {
        let described = (&self.pool).describe(sql).await?;
        Ok(described
            .columns()
            .iter()
            .map(|c| ColumnMeta {
                name: c.name().to_string(),
                type_name: c.type_info().name().to_string(),
            })
            .collect())
    }

    async fn close(&self) {
        tracing::info!("closing database pool");
        self.pool.close().await;
    }
}

fn bind_all<'q>(
    sql: &'q str,
    params: &[PgBindValue],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(p.clone());
    }
    query
}

fn rows_to_raw(rows: &[PgRow]) -> RawRows {
    let Some(first) = rows.first() else {
        return RawRows::default();
    };
    let columns = first.columns().iter().map(|c| c.name().to_string()).collect();
    let rows = rows
        .iter()
        .map(|row| (0..row.len()).map(|idx| cell_to_value(row, idx)).collect())
        .collect();
    RawRows { columns, rows }
}

/// NUMERIC as a JSON number when it survives the round trip through `f64`/`i64`,
/// otherwise as its exact decimal string.
pub fn numeric_to_value(d: Decimal) -> Value {
    let text = d.normalize().to_string();
    match Number::from_str(&text) {
        Ok(n) if n.to_string() == text => Value::Number(n),
        _ => Value::String(text),
    }
}

/// Decode one cell by its reported column type.
fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    let col = &row.columns()[idx];
    let decoded: Result<Option<Value>, sqlx::Error> = match col.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(idx).map(|v| v.map(Value::from)),
        "INT4" => row.try_get::<Option<i32>, _>(idx).map(|v| v.map(Value::from)),
        "INT8" => row.try_get::<Option<i64>, _>(idx).map(|v| v.map(Value::from)),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx).map(|v| v.map(|f| Value::from(f as f64))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx).map(|v| v.map(Value::from)),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(idx).map(|v| v.map(numeric_to_value)),
        "BOOL" => row.try_get::<Option<bool>, _>(idx).map(|v| v.map(Value::Bool)),
        "OID" => row.try_get::<Option<Oid>, _>(idx).map(|v| v.map(|o| Value::from(o.0))),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| v.map(|b| Value::String(format!("\\x{}", hex::encode(b))))),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .map(|v| v.map(|u| Value::String(u.to_string()))),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx)
            .map(|v| v.map(|d| Value::String(d.to_rfc3339()))),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(idx)
            .map(|v| v.map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(idx)
            .map(|v| v.map(|d| Value::String(d.format("%Y-%m-%d").to_string()))),
        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(idx)
            .map(|v| v.map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))),
        "INT2[]" => row.try_get::<Option<Vec<Option<i16>>>, _>(idx).map(|v| v.map(Value::from)),
        "INT4[]" => row.try_get::<Option<Vec<Option<i32>>>, _>(idx).map(|v| v.map(Value::from)),
        "INT8[]" => row.try_get::<Option<Vec<Option<i64>>>, _>(idx).map(|v| v.map(Value::from)),
        "FLOAT8[]" => row.try_get::<Option<Vec<Option<f64>>>, _>(idx).map(|v| v.map(Value::from)),
        "BOOL[]" => row.try_get::<Option<Vec<Option<bool>>>, _>(idx).map(|v| v.map(Value::from)),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => row
            .try_get::<Option<Vec<Option<String>>>, _>(idx)
            .map(|v| v.map(Value::from)),
        "NUMERIC[]" => row.try_get::<Option<Vec<Option<Decimal>>>, _>(idx).map(|v| {
            v.map(|items| {
                Value::Array(
                    items
                        .into_iter()
                        .map(|d| d.map(numeric_to_value).unwrap_or(Value::Null))
                        .collect(),
                )
            })
        }),
        _ => row.try_get::<Option<String>, _>(idx).map(|v| v.map(Value::String)),
    };
    match decoded {
        Ok(Some(v)) => v,
        Ok(None) => Value::Null,
        Err(e) => {
            tracing::warn!(column = %col.name(), type_name = %col.type_info().name(), error = %e, "column type not decodable; returning null");
            Value::Null
        }
    }
}

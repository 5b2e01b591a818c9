//! PgHandle against a live PostgreSQL server. Run with
//! `DATABASE_URL=postgres://... cargo test --test postgres -- --ignored`.

use serde_json::{json, Value};
use sql_gateway::db::ColumnMeta;
use sql_gateway::sql::PgBindValue;
use sql_gateway::{shape, Connection, Connector, PgConnector};
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

async fn connect(pool_size: u32) -> Arc<dyn Connection> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must name a scratch database");
    let options = PgConnectOptions::from_str(&url).unwrap();
    PgConnector::new(options, pool_size).connect().await.unwrap()
}

fn table(name: &str) -> String {
    format!("gw_{}_{}", name, std::process::id())
}

async fn run(conn: &Arc<dyn Connection>, sql: &str) -> Vec<serde_json::Map<String, Value>> {
    let raw = conn.query(sql, &[], false).await.unwrap();
    shape(&raw.columns, raw.rows)
}

async fn count(conn: &Arc<dyn Connection>, t: &str) -> Value {
    run(conn, &format!("SELECT count(*) AS n FROM {}", t)).await[0]["n"].clone()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn cells_keep_their_database_types() {
    let conn = connect(2).await;
    let t = table("decode");
    run(&conn, &format!("DROP TABLE IF EXISTS {}", t)).await;
    run(
        &conn,
        &format!(
            "CREATE TABLE {} (id BIGINT PRIMARY KEY, name TEXT, price NUMERIC(10,2), big NUMERIC, \
             tags TEXT[], counts INT4[], flag BOOL, ratio FLOAT8, raw BYTEA, doc JSONB, day DATE, qty INT4)",
            t
        ),
    )
    .await;
    run(
        &conn,
        &format!(
            "INSERT INTO {} VALUES (5, 'sprocket', 9.99, 12345678901234567890.123, '{{a,b}}', '{{1,NULL,3}}', \
             true, 0.25, '\\x0102'::bytea, '{{\"k\":1}}', '2024-02-29', NULL)",
            t
        ),
    )
    .await;

    let rows = run(&conn, &format!("SELECT * FROM {} WHERE id = 5", t)).await;
    assert_eq!(
        Value::Object(rows[0].clone()),
        json!({
            "id": 5,
            "name": "sprocket",
            "price": 9.99,
            "big": "12345678901234567890.123",
            "tags": ["a", "b"],
            "counts": [1, null, 3],
            "flag": true,
            "ratio": 0.25,
            "raw": "\\x0102",
            "doc": { "k": 1 },
            "day": "2024-02-29",
            "qty": null
        })
    );
    run(&conn, &format!("DROP TABLE {}", t)).await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn null_binds_into_typed_columns() {
    let conn = connect(2).await;
    let t = table("nulls");
    run(&conn, &format!("DROP TABLE IF EXISTS {}", t)).await;
    run(&conn, &format!("CREATE TABLE {} (id BIGINT PRIMARY KEY, qty INT4, price NUMERIC, seen DATE)", t)).await;
    run(&conn, &format!("INSERT INTO {} VALUES (1, 3, 1.5, '2024-01-01')", t)).await;

    conn.query(
        &format!("UPDATE {} SET qty = $1, price = $2, seen = $3 WHERE id = $4", t),
        &[PgBindValue::Null, PgBindValue::Null, PgBindValue::Null, PgBindValue::I64(1)],
        true,
    )
    .await
    .unwrap();
    let rows = run(&conn, &format!("SELECT qty, price, seen FROM {}", t)).await;
    assert_eq!(Value::Object(rows[0].clone()), json!({ "qty": null, "price": null, "seen": null }));
    run(&conn, &format!("DROP TABLE {}", t)).await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn committed_batch_is_all_or_nothing() {
    let conn = connect(2).await;
    let t = table("batch");
    run(&conn, &format!("DROP TABLE IF EXISTS {}", t)).await;
    run(&conn, &format!("CREATE TABLE {} (id BIGINT PRIMARY KEY)", t)).await;
    let insert = format!("INSERT INTO {} (id) VALUES ($1)", t);
    let batch = vec![
        vec![PgBindValue::I64(1)],
        vec![PgBindValue::I64(2)],
        vec![PgBindValue::I64(1)],
    ];

    assert!(conn.query_batch(&insert, &batch, true).await.is_err());
    assert_eq!(count(&conn, &t).await, json!(0));

    // autocommit keeps the rows before the failing one
    assert!(conn.query_batch(&insert, &batch, false).await.is_err());
    assert_eq!(count(&conn, &t).await, json!(2));
    run(&conn, &format!("DROP TABLE {}", t)).await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn describe_reports_columns_without_running() {
    let conn = connect(2).await;
    let t = table("describe");
    run(&conn, &format!("DROP TABLE IF EXISTS {}", t)).await;
    run(&conn, &format!("CREATE TABLE {} (id BIGINT, name TEXT)", t)).await;

    let cols = conn
        .describe(&format!("INSERT INTO {} (id, name) VALUES (1, 'x') RETURNING id, name", t))
        .await
        .unwrap();
    assert_eq!(
        cols,
        vec![
            ColumnMeta { name: "id".into(), type_name: "INT8".into() },
            ColumnMeta { name: "name".into(), type_name: "TEXT".into() },
        ]
    );
    assert_eq!(count(&conn, &t).await, json!(0));
    run(&conn, &format!("DROP TABLE {}", t)).await;
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn busy_pool_is_still_live() {
    let conn = connect(1).await;
    let busy = conn.clone();
    let slow = tokio::spawn(async move { busy.query("SELECT pg_sleep(2)::text AS done", &[], false).await });
    tokio::time::sleep(Duration::from_millis(300)).await;

    let live = tokio::time::timeout(Duration::from_secs(1), conn.is_live()).await;
    assert!(matches!(live, Ok(true)));
    assert!(slow.await.unwrap().is_ok());

    conn.close().await;
    assert!(!conn.is_live().await);
}

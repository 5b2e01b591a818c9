use clap::Parser;
use sql_gateway::{gateway_routes, load_config, AppState, ConnectionManager, PgConnector, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "REST gateway over configured PostgreSQL queries")]
struct Args {
    /// Configuration file
    #[arg(long, env = "GATEWAY_CONFIG", default_value = "config.json")]
    config: String,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "GATEWAY_LOG", default_value = "info")]
    loglevel: String,
    /// Listen address
    #[arg(long, env = "GATEWAY_BIND", default_value = "0.0.0.0:5000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("sql_gateway={},tower_http=info", args.loglevel.to_lowercase()))),
        )
        .init();

    let config = load_config(&args.config).await?;
    let registry = Registry::build(&config)?;
    let db = ConnectionManager::connect(
        PgConnector::from_config(&config),
        Duration::from_secs(config.query_timeout_secs),
    )
    .await?;
    let state = AppState {
        registry: Arc::new(registry),
        db: Arc::new(db),
    };

    let app = gateway_routes(state.clone(), config.max_body_bytes);
    let listener = TcpListener::bind(&args.bind).await?;
    tracing::info!(version = %config.version, "listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    state.db.shutdown().await;
    tracing::info!("shut down");
    Ok(())
}

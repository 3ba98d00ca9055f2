//! Stock Ledger Service - Backend Server

use std::{net::SocketAddr, sync::Arc};

use backend::{create_app, AppState, Config, PoolRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ledger_server=debug,backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Stock Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    // Tenant pools are created lazily on first request
    let registry = PoolRegistry::new(&config.database)?;
    tracing::info!(
        max_connections = config.database.max_connections,
        max_in_flight_queries = config.report.max_in_flight_queries,
        "Tenant pool registry ready"
    );

    let state = AppState {
        registry: Arc::new(registry),
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

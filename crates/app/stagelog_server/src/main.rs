//! Stagelog API server binary.
//!
//! Reads configuration from the environment (a missing or unusable
//! secret aborts startup), runs migrations, and serves the API.

use std::net::SocketAddr;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use stagelog_api::config::ApiConfig;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "stagelog_server", about = "Stagelog API server")]
struct Args {
    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Skip running database migrations on startup.
    #[arg(long, default_value_t = false)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,stagelog_api=debug,stagelog_core=debug".parse().unwrap()
            }),
        )
        .init();

    let args = Args::parse();

    // Fail fast: bad or missing secrets must never reach request time.
    let config = ApiConfig::from_env()?;

    info!(bind_addr = %config.bind_addr, "starting stagelog_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    if !args.no_migrate {
        info!("running database migrations");
        stagelog_api::migrate(&pool).await?;
    }

    let state = stagelog_api::AppState::new(pool, config.clone())?;
    let app = stagelog_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    // Client addresses feed the login lockout, so the handlers need
    // per-connection peer info.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

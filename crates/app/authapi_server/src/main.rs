//! authapi HTTP server binary.
//!
//! Loads configuration from flags / environment (`.env` honoured), connects
//! the PostgreSQL pool, runs migrations, and serves the API until Ctrl-C or
//! SIGTERM.

use std::time::Duration;

use authapi_api::config::{ApiConfig, DEFAULT_BIND_ADDR, parse_list};
use authapi_api::{AppState, router};
use authapi_core::auth::token::TokenProvider;
use authapi_core::service::AccountService;
use authapi_core::store::PgAccountStore;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

/// How long in-flight requests may run after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// CLI arguments for the server.
#[derive(Parser)]
#[command(name = "authapi_server", about = "authapi account server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = DEFAULT_BIND_ADDR)]
    addr: String,

    /// Token signing secret.
    #[arg(long, env = "SERVER_SECRET", hide_env_values = true)]
    secret: String,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Comma-separated CORS origins.
    #[arg(long, env = "SERVER_ALLOWED_ORIGINS")]
    allowed_origins: String,

    /// Comma-separated CORS headers (allowed and exposed).
    #[arg(long, env = "SERVER_ALLOWED_HEADERS", default_value = "")]
    allowed_headers: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,authapi_api=debug,authapi_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.addr,
        database_url: args.database_url,
        jwt_secret: args.secret,
        allowed_origins: parse_list(&args.allowed_origins),
        allowed_headers: parse_list(&args.allowed_headers),
    };
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return Err(e.into());
    }

    info!(
        addr = %config.bind_addr,
        max_connections = args.max_connections,
        "starting authapi_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;
    info!("postgres connected");

    info!("running database migrations");
    authapi_core::migrate::migrate(&pool).await?;

    let tokens = TokenProvider::new(config.jwt_secret.as_bytes())?;
    let service = AccountService::new(PgAccountStore::new(pool.clone()), tokens);
    let state = AppState::new(service);
    let shutdown = state.shutdown.clone();

    let app = router(state, &config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // In-flight requests get a grace period, then their work is
            // cancelled and any open transaction rolls back.
            tokio::spawn(async move {
                tokio::time::sleep(SHUTDOWN_GRACE).await;
                shutdown.cancel();
            });
        })
        .await?;

    pool.close().await;
    info!("server shutdown gracefully");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

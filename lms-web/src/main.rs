//! lms-web - course marketplace payment and enrollment service
//!
//! Configuration priority: CLI flag > environment > TOML file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lms_common::config::{
    CliOverrides, ServiceConfig, ENV_API_SECRET, ENV_BIND, ENV_DATABASE, ENV_KASPI_SECRET,
};
use lms_common::db::init_database;
use lms_web::{build_router, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lms-web", version, about = "Course marketplace payment and enrollment service")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "LMS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = ENV_DATABASE)]
    database: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5780
    #[arg(short, long, env = ENV_BIND)]
    bind: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            config_path: args.config,
            database: args.database,
            bind: args.bind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliOverrides::from(Args::parse());

    // Log level lives in config, so resolve before tracing is up
    let config = ServiceConfig::resolve(&cli).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    // Build identification first, before any database delay
    info!(
        "Starting lms-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path, config.db_timeout()).await {
        Ok(pool) => {
            info!("Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    if config.kaspi_secret.is_none() {
        warn!(
            "{} is not set; payment notifications will be rejected",
            ENV_KASPI_SECRET
        );
    }
    if config.api_secret.is_none() {
        warn!(
            "{} is not set; internal API authentication is DISABLED",
            ENV_API_SECRET
        );
    }

    let state = AppState::new(pool, &config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("lms-web listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Quiz Assembly (qprep-qa) - Main entry point
//!
//! HTTP microservice that assembles practice quizzes from the question
//! corpus. Identity and quota live in the accounts service; this module
//! only reads the corpus and reports usage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qprep_common::config::{resolve_database_path, BootstrapConfig};
use qprep_common::db::init_database;
use qprep_qa::engine::QuizAssembler;
use qprep_qa::quota::HttpQuotaLedger;
use qprep_qa::repo::SqliteQuestionRepository;
use qprep_qa::settings::EngineSettings;
use qprep_qa::{build_router, AppState};

/// Command-line arguments for qprep-qa
#[derive(Parser, Debug)]
#[command(name = "qprep-qa")]
#[command(about = "Quiz Assembly microservice for QPrep")]
#[command(version)]
struct Args {
    /// Path to the bootstrap TOML configuration file
    #[arg(short, long, env = "QPREP_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "QPREP_QA_PORT")]
    port: Option<u16>,

    /// Path to the questions database (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Base URL of the accounts service (overrides config)
    #[arg(long, env = "QPREP_ACCOUNTS_URL")]
    accounts_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = BootstrapConfig::load(args.config.as_deref())
        .context("Failed to load bootstrap configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting QPrep Quiz Assembly"
    );

    let db_path = resolve_database_path(args.database.as_deref(), "QPREP_DATABASE", &config);
    info!("Questions database: {}", db_path.display());

    let db = init_database(&db_path)
        .await
        .context("Failed to initialize questions database")?;

    let engine_settings = EngineSettings::load(&db)
        .await
        .context("Failed to load engine settings")?;

    let accounts_url = args
        .accounts_url
        .unwrap_or_else(|| config.accounts_base_url.clone());
    info!("Accounts service: {}", accounts_url);
    let ledger = Arc::new(
        HttpQuotaLedger::new(&accounts_url).context("Failed to build quota ledger client")?,
    );

    let repo = Arc::new(SqliteQuestionRepository::new(db.clone()));
    let assembler = Arc::new(QuizAssembler::new(repo, ledger.clone(), engine_settings));

    let state = AppState::new(db, assembler, ledger);
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

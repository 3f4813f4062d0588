//! # YaMDb Server
//!
//! Review aggregation API: users rate titles (films, books, music) from 1 to
//! 10, discuss reviews in comment threads, and each title carries the mean
//! of its scores.
//!
//! ## Commands
//!
//! - `yamdb-server` (or `yamdb-server serve`): run the HTTP API
//! - `yamdb-server migrate`: apply database migrations and exit
//! - `yamdb-server import --dir <DIR>`: load CSV tables into the database

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yamdb_config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use yamdb_core::application::{AppUnitOfWork, CsvImporter};
use yamdb_server::{
    create_app,
    infra::startup::{build_app_state, connect_postgres},
};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "yamdb-server")]
#[command(about = "Review aggregation API for films, books and music")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "YAMDB_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Import users, catalog, reviews and comments from CSV files
    Import {
        /// Directory holding users.csv, category.csv, genre.csv, titles.csv,
        /// genre_title.csv, review.csv and comments.csv
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(&cli.serve).await,
        Command::Migrate => run_migrate(&cli.serve).await,
        Command::Import { dir } => run_import(&cli.serve, &dir).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.as_ref() {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = args.env_file.as_ref() {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }
    log_warnings(&warnings);

    Ok(config)
}

fn log_warnings(warnings: &ConfigWarnings) {
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }
}

async fn run_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let Some(url) = config.database.url.as_deref() else {
        bail!("DATABASE_URL must be set to run migrations");
    };

    connect_postgres(url, config.database.max_connections).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_import(args: &ServeArgs, dir: &Path) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let Some(url) = config.database.url.as_deref() else {
        bail!("DATABASE_URL must be set to import data");
    };

    let postgres =
        connect_postgres(url, config.database.max_connections).await?;
    let uow = AppUnitOfWork::from_postgres(&postgres);
    let report = CsvImporter::new(&uow)
        .import_dir(dir)
        .await
        .with_context(|| format!("import from {} failed", dir.display()))?;

    for (table, stats) in [
        ("users", report.users),
        ("categories", report.categories),
        ("genres", report.genres),
        ("titles", report.titles),
        ("genre links", report.genre_links),
        ("reviews", report.reviews),
        ("comments", report.comments),
    ] {
        info!(created = stats.created, matched = stats.matched, "{table}");
    }
    Ok(())
}

async fn run_server(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let bind_address = config.server.bind_address();

    let state = build_app_state(config).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("Starting YaMDb server on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use clap::Parser;
use colored::*;
use config_engine::ConfigLoader;
use error_common::{log_error, CarebookError, Result};
use tracing::info;

use carebook_server::{create_app, CarebookServer, Unit};

/// Carebook Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "carebook-server")]
#[command(about = "Hospital records, staff leave and personal ledger API server")]
struct Args {
    /// Server bind address; overrides `server.host`
    #[arg(long, env = "CAREBOOK_HOST")]
    host: Option<String>,

    /// Server port; overrides `server.port`
    #[arg(short, long, env = "CAREBOOK_PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = "carebook-server.yaml")]
    config: String,

    /// Route groups to serve
    #[arg(long, value_enum, default_value_t = Unit::All)]
    unit: Unit,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::new()
        .with_file(&args.config)
        .load()
        .map_err(|e| CarebookError::ConfigError(e.to_string()))?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    config
        .validate()
        .map_err(|e| CarebookError::ConfigError(e.to_string()))?;

    logger_redacted::init_tracing(&config.logging)
        .map_err(|e| CarebookError::InternalError(format!("Logger init failed: {e}")))?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("🏥 {}", "Starting Carebook Engine HTTP Server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("🌍 Environment: {}", config.environment.as_str().bright_white());
    info!("🧩 Unit: {}", args.unit.as_str().bright_white());
    info!("🌐 Bind address: {}", addr.bright_yellow());

    let server = CarebookServer::new(config, args.unit).await.map_err(|e| {
        let err = CarebookError::from(e);
        log_error("server initialisation", &err);
        err
    })?;
    let app = create_app(server);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CarebookError::NetworkError(format!("Failed to bind to {addr}: {e}")))?;

    info!("🚀 {}", format!("Carebook Engine server running on http://{addr}").bright_green());
    info!("📋 {}", format!("Health check available at: http://{addr}/health").bright_blue());
    info!("📋 {}", format!("OpenAPI document at: http://{addr}/api-docs/openapi.json").bright_blue());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CarebookError::ServerError(format!("HTTP server error: {e}")))?;

    info!("👋 {}", "Carebook Engine server stopped".bright_yellow());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

// src/main.rs - Phishing awareness simulation server
use clap::Parser;
use phish_aware::config::{self, Config, ConfigError};
use phish_aware::web::api::{AppStateInner, create_router};
use std::net::SocketAddr;
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "phish-aware.toml";

#[derive(Parser, Debug)]
#[command(name = "phish-aware", version, about = "Phishing awareness simulation server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
    /// Address to bind, overrides the config file
    #[arg(long)]
    host: Option<String>,
    /// Port to bind, overrides the config file
    #[arg(short, long)]
    port: Option<u16>,
    /// Enable debug mode (admin log endpoints)
    #[arg(long)]
    debug: bool,
}

fn load(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => match config::load_config(DEFAULT_CONFIG_PATH) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e),
        },
    };
    config.apply_env();
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.debug {
        config.server.debug = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();
    let config = load(&cli).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;

    // Initialize logging
    let level = config.server.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!("Starting Phishing Awareness Tool");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if cli.config.is_none() {
        tracing::info!("Configuration: {} (defaults where absent)", DEFAULT_CONFIG_PATH);
    }
    tracing::info!("Debug mode: {}", config.server.debug);
    tracing::info!(
        "Rate limit: {} attempts per {}s per address",
        config.simulation.max_attempts_per_ip,
        config.simulation.rate_limit_secs
    );
    tracing::info!("Attempt log: {}", config.simulation.log_path.display());

    let state = Arc::new(AppStateInner::from_config(&config));

    // Ensure the attempt log exists so admins can read it before any capture.
    if let Err(e) = state.logger.ensure_store().await {
        tracing::error!("Cannot create attempt log '{}': {}", config.simulation.log_path.display(), e);
    }

    // Periodically drop addresses whose rate-limit window has emptied.
    let tracker = state.tracker.clone();
    let sweep_every = config.simulation.sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        interval.tick().await;
        loop {
            interval.tick().await;
            tracker.sweep().await;
        }
    });

    let app = create_router(state);

    let bind = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

// src/main.rs
//! Dashboard auth server entry point
use anyhow::Result;
use clap::{Parser, Subcommand};
use dashboard_auth::{AppConfig, AppServer};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "dashboard-auth")]
#[command(about = "Dashboard authentication server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Server {
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind the server to (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging()?;

    info!("Starting dashboard-auth v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load()?;
    if let Some(Commands::Server { host, port }) = args.command {
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }
    }

    if config.auth.expose_reset_token {
        tracing::warn!("reset tokens are returned in API responses (development mode)");
    }
    let server = AppServer::new(config)?;
    if !server.auth.oauth_enabled() {
        info!("Google sign-in disabled; set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET to enable");
    }
    server.start().await?;

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,h2=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use modeldesk_core::ApiConfig;
use modeldesk_server::{serve, ServerConfig};

#[derive(Parser)]
#[command(name = "modeldesk-server", about = "Serve the modeldesk console", version)]
struct Args {
    /// YAML file with backend endpoints
    #[arg(long, short, env = "MODELDESK_CONFIG")]
    config: Option<PathBuf>,
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind to
    #[arg(long, short, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let api = match &args.config {
        Some(path) => ApiConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ApiConfig::default(),
    };

    serve(ServerConfig {
        host: args.host,
        port: args.port,
        api,
    })
    .await
}

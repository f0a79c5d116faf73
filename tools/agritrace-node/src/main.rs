use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use agritrace_node::auth::UserDirectory;
use agritrace_node::{build_router, AppState};

#[derive(Parser)]
#[command(name = "agritrace-node", about = "Agritrace certification backend")]
struct Cli {
    /// HTTP port to listen on.
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Directory holding the persisted user directory
    /// (default: the platform data dir).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep registered users in memory only.
    #[arg(long)]
    ephemeral: bool,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("agritrace")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let users = if cli.ephemeral {
        UserDirectory::in_memory()
    } else {
        let dir = cli.data_dir.unwrap_or_else(default_data_dir);
        UserDirectory::with_storage(dir.join("users.json"))
    };

    let state = Arc::new(AppState::new(users));
    let app = build_router(state);

    let addr = format!("{}:{}", cli.bind, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "agritrace node listening");

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}

mod api;
mod cli;
mod pipeline;
mod router;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pdfqa_core::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::state::AppState;

fn load_config(profile: Option<&str>) -> Config {
    match profile {
        Some(p) => Config::for_profile(p),
        None => Config::from_env(),
    }
}

async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    config.log_summary();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config)?);
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // First, so RUST_LOG and PDFQA_PROFILE can come from .env.
    pdfqa_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.profile.as_deref());

    match args.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Ask { file, question } => cli::ask(&config, &file, &question).await,
    }
}

//! Token gate demo server.
//!
//! Serves `/api/public` openly and four routes protected by configurable
//! predicate chains.

mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use token_gate::{HttpIdentityResolver, HttpTeamDirectory, HttpTransport};
use token_gate_sdk::TeamDirectoryClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::DemoConfig;
use crate::routes::{Collaborators, router};

#[derive(Debug, Parser)]
#[command(name = "token-gate-demo", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long, default_value = "config/demo.yaml")]
    config: PathBuf,

    /// Override the listen address from the configuration.
    #[arg(long)]
    bind: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = DemoConfig::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let transport =
        HttpTransport::new(&config.gate.transport).context("failed to build HTTP transport")?;
    let resolver = HttpIdentityResolver::new(transport.clone(), &config.gate.introspection)?;
    let directory = config
        .gate
        .team_api
        .url
        .as_deref()
        .map(|url| HttpTeamDirectory::new(transport.clone(), url))
        .transpose()?
        .map(|directory| Arc::new(directory) as Arc<dyn TeamDirectoryClient>);

    let app = router(
        &config,
        &Collaborators {
            resolver: Arc::new(resolver),
            directory,
        },
    )?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(
        bind = %config.bind,
        deadline = ?config.gate.deadline,
        token_in_header = config.gate.introspection.token_in_header,
        "token gate demo listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

//! Snapshot-compatible file resolver service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use debsnap_fetch::RateGovernor;
use debsnap_resolve::MirrorResolver;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;
mod routes;

use config::AppConfig;
use routes::AppState;

#[derive(Parser, Debug)]
#[command(name = "debsnap", version, about = "Resolve Debian package files via snapshot.debian.org and mirrors")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "debsnap.toml")]
    config: PathBuf,

    /// Listen address, overriding `server.bind`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debsnap=info,tower_http=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let governor = Arc::new(RateGovernor::new(config.fetch.request_spacing()));
    let resolver = MirrorResolver::from_config(&config.resolver, config.fetch.clone(), Arc::clone(&governor))
        .context("failed to initialize resolver")?;
    let state = Arc::new(AppState { resolver, governor });

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(
        addr = %config.server.bind,
        mirrors = config.resolver.mirrors.len(),
        snapshot = %config.resolver.snapshot_url,
        "listening"
    );

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalog_httpd::config::{Cli, Config};
use catalog_httpd::server::{listener, ServerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli).context("loading configuration")?;

    let listener = listener::bind(cfg.http_port, cfg.server.backlog)?;
    let context = Arc::new(ServerContext::from_config(&cfg));

    tracing::info!(
        root = %cfg.static_files.root.display(),
        datastore = %cfg.datastore_addr(),
        "Serving"
    );

    tokio::select! {
        res = listener::run(listener, context, cfg.server.concurrent) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

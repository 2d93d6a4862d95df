use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;

use store_taxonomy::config::Config;
use store_taxonomy::orchestrator::Orchestrator;
use store_taxonomy::session::RemoteBrowserProvider;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    store_taxonomy::logging::init().context("init logging")?;

    let cli = store_taxonomy::cli::Cli::from_env().context("read configuration")?;
    tracing::debug!(?cli, "parsed cli");

    let config = Config::from_cli(cli).context("build configuration")?;
    let targets = config.load_store_targets().context("load stores")?;
    tracing::info!(
        stores = targets.len(),
        threads = config.threads,
        "configuration loaded"
    );

    let provider = Arc::new(RemoteBrowserProvider::new(config.grid_url.clone()));
    let orchestrator = Orchestrator::new(provider, config.base_url.clone(), config.threads);
    let records = orchestrator.run(targets, shutdown_signal()).await;

    // A failed write is reported but does not fail the run.
    if let Err(err) = store_taxonomy::output::write(&config.output_dir, &config.source, records).await
    {
        tracing::error!(?err, "failed to write category document");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

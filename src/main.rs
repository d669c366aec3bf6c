use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use vaultkeep::{utils::config::Config, utils::logging::init_logging, Application};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.node).context("Failed to initialise logging")?;

    info!("Starting vaultkeep v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(config).map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;

    app.start().await.map_err(|e| {
        error!("Failed to start application: {}", e);
        e
    })?;

    // Wait for shutdown signal
    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    } else {
        info!("Received shutdown signal");
    }

    if let Err(e) = app.shutdown().await {
        error!("Error during shutdown: {}", e);
    }

    Ok(())
}

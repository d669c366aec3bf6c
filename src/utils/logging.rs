// src/utils/logging.rs
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::config::NodeConfig;
use crate::utils::error::{NodeError, Result};

/// Installs the global subscriber. `RUST_LOG` wins over `node.log_level`.
///
/// When `node.log_dir` is set, output also goes to a daily rolling file; keep
/// the returned guard alive for as long as logs should be flushed.
pub fn init_logging(config: &NodeConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| NodeError::Config(format!("Invalid log level: {}", e)))?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vaultkeep.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()
                .map_err(|e| NodeError::Config(format!("Failed to install logger: {}", e)))?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .try_init()
                .map_err(|e| NodeError::Config(format!("Failed to install logger: {}", e)))?;

            Ok(None)
        }
    }
}

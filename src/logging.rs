//! Logging configuration for the shop assistant

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "shopassist.log";

/// Initialize console and daily-rolling file logging.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_logging_with_config(config: Option<&LoggingConfig>) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = config.map_or("info", |c| c.level.as_str());
            EnvFilter::new(format!("{level},shopassist={level}"))
        }
    };
    install(env_filter)
}

/// Initialize logging with a fixed level, ignoring `RUST_LOG`
pub fn init_logging_with_level(level: &str) -> Result<()> {
    install(EnvFilter::new(format!("{level},shopassist={level}")))
}

fn install(env_filter: EnvFilter) -> Result<()> {
    let logs_dir = Path::new(LOG_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::ShopAssistError::StartupConfiguration(format!("logging: {e}")))?;

    tracing::info!("Logging initialized, writing to {}/{}.YYYY-MM-DD", LOG_DIR, LOG_FILE);

    // Flushing worker must live for the whole process
    std::mem::forget(guard);

    Ok(())
}

/// Initialize console-only logging for tests and one-shot commands
pub fn init_simple_logging() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_logging_is_reentrant() {
        assert!(init_simple_logging().is_ok());
        assert!(init_simple_logging().is_ok());
    }
}

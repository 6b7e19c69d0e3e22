use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, DEFAULT_LOG_FILTER, LOG_FILE_PREFIX};

/// Keeps the background file writer alive; drop it last so buffered
/// records are flushed on exit.
#[must_use]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber: JSON records on stderr plus, unless
/// disabled, a daily-rolling JSON file under the configured log directory.
///
/// Calling this twice keeps the first subscriber. `log` records (sqlx
/// statement logging) are bridged into `tracing` by the subscriber.
pub fn init(config: &Config) -> anyhow::Result<LoggingGuard> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("build log filter")?;

    let stderr_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stderr);

    let (file_layer, guard) = if config.log_to_file {
        let dir = config.log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create log directory {}", dir.display()))?;
        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    tracing::info!(
        target: "fitpro",
        event = "logging_init",
        installed,
        file_sink = config.log_to_file,
        log_dir = %config.log_dir().display()
    );

    Ok(LoggingGuard { _file: guard })
}

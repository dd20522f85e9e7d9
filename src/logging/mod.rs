// Logging setup
//
// Console output goes to stderr so page dumps on stdout stay clean. File
// logging (JSON, rotating) is added on top when enabled in config.
//
// Precedence: RUST_LOG env var > config file > default "info"

use crate::config::{Config, LogRotation, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is not set
fn default_filter(logging: &LoggingConfig) -> String {
    format!("postwire={},tower_http=info,axum=info", logging.level)
}

fn file_appender(logging: &LoggingConfig) -> RollingFileAppender {
    let dir = &logging.file_dir;
    let prefix = &logging.file_prefix;
    match logging.file_rotation {
        LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
        LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
        LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.logging).into());
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if !config.logging.file_enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.logging.file_dir) {
        eprintln!(
            "Warning: Could not create log directory {:?}: {}",
            config.logging.file_dir, e
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return None;
    }

    // Writes happen on a background thread
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender(&config.logging));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_configured_level() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(
            default_filter(&logging),
            "postwire=debug,tower_http=info,axum=info"
        );
    }
}

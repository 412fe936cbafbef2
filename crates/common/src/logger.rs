use crate::config::LogSettings;
use crate::error::RagError;
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Directives appended to the configured level. The Neo4j driver reports
/// query notifications at INFO.
const QUIET_TARGETS: &str = "neo4rs=warn";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "vectorrag.log";

/// Logging handle for one run.
///
/// The subscriber stays installed as the thread's default while this value
/// is alive; dropping it restores the previous subscriber.
#[must_use = "logging stops when the guard is dropped"]
pub struct LogGuard {
    _guard: DefaultGuard,
}

/// Build the filter for a configured level (RUST_LOG env var takes precedence)
fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{}", log_level, QUIET_TARGETS)))
}

/// Initialize logging for a run
///
/// Logs go to stderr and, when a log directory is configured, to
/// `<dir>/vectorrag.log`. Stdout is left to the answer output.
pub fn setup_logging(settings: &LogSettings) -> Result<LogGuard, RagError> {
    let level = parse_log_level(&settings.level)?;

    // Console output layer
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(build_filter(&settings.level));

    // File output layer
    let file_layer = match &settings.dir {
        Some(log_dir) => {
            if !log_dir.exists() {
                std::fs::create_dir_all(log_dir).map_err(|e| {
                    RagError::invalid_setting(format!(
                        "Failed to create log directory {}: {}",
                        log_dir.display(),
                        e
                    ))
                })?;
            }

            let log_file_path = log_dir.join(LOG_FILE_NAME);
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file_path)
                .map_err(|e| {
                    RagError::invalid_setting(format!(
                        "Failed to open log file {}: {}",
                        log_file_path.display(),
                        e
                    ))
                })?;

            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(log_file))
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false) // Remove ANSI color codes in files
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(build_filter(&settings.level)),
            )
        }
        None => None,
    };

    let guard = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .set_default();

    tracing::debug!(
        "Logging initialized: level={}, log_dir={:?}",
        level,
        settings.dir
    );

    Ok(LogGuard { _guard: guard })
}

/// Parse string to tracing Level
pub fn parse_log_level(level: &str) -> Result<Level, RagError> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(RagError::invalid_setting(format!(
            "Invalid log level '{}', expected trace, debug, info, warn or error",
            level
        ))),
    }
}

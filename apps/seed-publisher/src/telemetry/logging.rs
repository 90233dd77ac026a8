use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;

use clap::ValueEnum;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Overrides the computed filter entirely, e.g. `seedbank::client=trace,warn`.
pub const FILTER_ENV: &str = "SEEDBANK_LOG_FILTER";
/// Lets dependency crates trace at `trace` level too.
pub const TRACE_DEPS_ENV: &str = "SEEDBANK_TRACE_DEPS";

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) -> Result<(), InitError> {
    if GUARD.get().is_some() {
        return Ok(());
    }

    let (writer, guard) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| InitError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config.level))
        .with_target(config.level >= LogLevel::Debug)
        .with_thread_names(config.level >= LogLevel::Trace)
        .with_ansi(config.file.is_none())
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| InitError::Configure(err.to_string()))?;
    let _ = GUARD.set(guard);
    Ok(())
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    match std::env::var(FILTER_ENV) {
        Ok(filter) => EnvFilter::new(filter),
        Err(_) => {
            let allow_deps = super::env_truthy(TRACE_DEPS_ENV).unwrap_or(false);
            EnvFilter::new(default_filter_for(level, allow_deps))
        }
    }
}

const NOISY_DEPS: &[&str] = &["rustls", "jsonwebtoken"];

fn default_filter_for(level: LogLevel, allow_deps: bool) -> String {
    let mut filter = match level {
        LogLevel::Trace => "info,seedbank=trace,seed_publisher=trace".to_owned(),
        LogLevel::Debug => "info,seedbank=debug,seed_publisher=debug".to_owned(),
        other => other.as_str().to_owned(),
    };
    if level == LogLevel::Trace && !allow_deps {
        for target in NOISY_DEPS {
            filter.push(',');
            filter.push_str(target);
            filter.push_str("=info");
        }
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_enables_crate_targets_only() {
        assert_eq!(
            default_filter_for(LogLevel::Debug, false),
            "info,seedbank=debug,seed_publisher=debug"
        );
    }

    #[test]
    fn trace_throttles_dependencies_unless_allowed() {
        let throttled = default_filter_for(LogLevel::Trace, false);
        assert!(throttled.ends_with("rustls=info,jsonwebtoken=info"));
        let open = default_filter_for(LogLevel::Trace, true);
        assert!(!open.contains("rustls"));
    }

    #[test]
    fn quieter_levels_map_to_plain_directives() {
        assert_eq!(default_filter_for(LogLevel::Warn, false), "warn");
        assert_eq!(default_filter_for(LogLevel::Error, true), "error");
    }

    #[test]
    fn levels_are_ordered_by_verbosity() {
        assert!(LogLevel::Trace > LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}

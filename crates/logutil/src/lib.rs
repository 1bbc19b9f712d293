//! Utilities for logging.
use std::io;
use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "human_readable" | "pretty" => Ok(LogFormat::HumanReadable),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

/// Build an env filter, falling back to `default_level` if `RUST_LOG` isn't
/// set or can't be parsed.
fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy()
}

/// Configure the global subscriber.
///
/// Subsequent calls are no-ops.
pub fn configure_global_logger<W>(default_level: Level, format: LogFormat, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let _ = try_configure_global_logger(default_level, format, writer);
}

fn try_configure_global_logger<W>(
    default_level: Level,
    format: LogFormat,
    writer: W,
) -> Result<(), SetGlobalDefaultError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(writer);

    match format {
        LogFormat::HumanReadable => {
            tracing::subscriber::set_global_default(builder.with_target(false).finish())
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

/// Initialize a logger for tests, writing to stderr at trace level.
pub fn init_test() {
    configure_global_logger(Level::TRACE, LogFormat::HumanReadable, io::stderr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_format() {
        assert_eq!(LogFormat::Json, "JSON".parse().unwrap());
        assert_eq!(LogFormat::HumanReadable, "human".parse().unwrap());
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn init_twice() {
        init_test();
        init_test();
    }
}

// src/telemetry.rs

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::error::UnknownLevelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log handle built from a level name. Installing it as the global subscriber
/// is a separate step (`init`) so the level can be validated with the rest of
/// the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    level: Level,
}

/// Accepts trace, debug, info, warn or error (case and surrounding whitespace ignored).
pub fn logger(level: &str) -> Result<Logger, UnknownLevelError> {
    let parsed = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => return Err(UnknownLevelError(level.to_string())),
    };
    Ok(Logger { level: parsed })
}

impl Logger {
    pub fn level(&self) -> Level {
        self.level
    }

    /// tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR.
    pub fn is_enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn is_debug(&self) -> bool {
        self.is_enabled(Level::DEBUG)
    }

    /// Installs the global subscriber on stderr. `RUST_LOG` directives are layered
    /// on top of the configured level.
    pub fn init(&self, format: LogFormat) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy();

        match format {
            LogFormat::Json => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .json()
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init(),
        }
    }
}

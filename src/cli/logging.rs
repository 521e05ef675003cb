//! Logging setup
//!
//! Filter: `$BUILDSENSE_LOG`, else `logging.level`. Output goes to stderr, or
//! to `logging.file` (non-rolling) when set. Stdout stays reserved for
//! command output.

use crate::cli::{Error, Result};
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "BUILDSENSE_LOG";

/// Build the filter from `$BUILDSENSE_LOG` or the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| Error::Logging(format!("invalid log level '{}': {}", level, e))),
    }
}

/// Install the global subscriber
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<()> {
    let filter = build_filter(level)?;

    let (stderr_layer, file_layer) = match file {
        Some(path) => {
            let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
            let dir = dir.unwrap_or_else(|| Path::new("."));
            fs::create_dir_all(dir)?;
            let name = path.file_name().ok_or_else(|| {
                Error::Logging(format!("log file '{}' has no file name", path.display()))
            })?;
            let appender = tracing_appender::rolling::never(dir, name);
            let layer = fmt::layer().with_writer(appender).with_ansi(false);
            (None, Some(layer))
        }
        None => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

//! Home directory resolution
//!
//! Priority:
//! 1. --home <path> flag (highest priority)
//! 2. $BUILDSENSE_HOME env var
//! 3. Current directory "." (default)

use crate::cli::{Error, Result};
use std::path::PathBuf;

/// Environment variable naming the home directory
pub const HOME_ENV: &str = "BUILDSENSE_HOME";

/// Resolve the home directory from the flag and the process environment
pub fn resolve_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_home_with(explicit, std::env::var(HOME_ENV).ok())
}

/// [`resolve_home`] with an explicit environment value
///
/// An explicit `--home` must exist. `$BUILDSENSE_HOME` is used as-is; it is
/// created during bootstrap.
pub fn resolve_home_with(explicit: Option<PathBuf>, env_home: Option<String>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_dir() {
            return Err(Error::InvalidArgs(format!(
                "home '{}' does not exist or is not a directory",
                path.display()
            )));
        }
        return Ok(path);
    }

    if let Some(home) = env_home.filter(|h| !h.trim().is_empty()) {
        return Ok(PathBuf::from(home));
    }

    Ok(PathBuf::from("."))
}

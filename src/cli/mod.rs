//! CLI module
//!
//! Provides:
//! - Argument parsing (`clap` derive)
//! - Home resolution (flag → env → cwd)
//! - Logging setup
//! - Bootstrap: directories, seeded knowledge, adapter checks
//! - Command dispatch

pub mod args;
pub mod bootstrap;
pub mod dispatch;
pub mod home;
pub mod logging;

// Re-exports
pub use args::{Cli, Commands};
pub use bootstrap::{ensure_infrastructure, open_knowledge_base, BootstrapStatus};
pub use dispatch::{run_cli, ExitCode};
pub use home::resolve_home;
pub use logging::init_logging;

use crate::config::ConfigError;
use crate::llm::AdapterError;
use crate::records::RecordError;
use buildsense_knowledge::KnowledgeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("LLM error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("{0}")]
    Records(#[from] RecordError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgs(_) | Error::Config(_) | Error::Bootstrap(_) | Error::Logging(_) => {
                EXIT_CONFIG_ERROR
            }
            Error::Adapter(AdapterError::Configuration(_)) => EXIT_CONFIG_ERROR,
            _ => EXIT_FAILURE,
        }
    }
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

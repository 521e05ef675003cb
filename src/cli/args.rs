//! CLI argument parsing
//!
//! `buildsense [--home DIR] <command>`

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Input name that reads the log from stdin
pub const STDIN_INPUT: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "buildsense", version, about = "Build failure log diagnosis")]
pub struct Cli {
    /// Home directory holding config.toml and data (default: $BUILDSENSE_HOME or .)
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Analyze one build log and print the result as JSON
    Analyze {
        /// Log file, or "-" for stdin
        input: String,

        /// Name recorded as the log source (default: file name or "stdin")
        #[arg(long)]
        source: Option<String>,

        /// Condense the result into a knowledge document afterwards
        #[arg(long)]
        learn: bool,
    },

    /// Analyze every supported log in the input directory
    Scan,

    /// Add a document to the knowledge base
    Ingest {
        /// File whose content becomes the document
        file: PathBuf,

        /// Metadata entry, repeatable
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },

    /// Search the knowledge base and print hits as JSON
    Search {
        query: String,

        /// Number of hits (default: knowledge.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Seed built-in knowledge into an empty knowledge base
    Seed,

    /// List persisted analysis records
    History,

    /// Show configuration and knowledge base status
    Status,
}

/// Parse `key=value`
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

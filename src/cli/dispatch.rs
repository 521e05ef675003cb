//! CLI command dispatch
//!
//! Setup (home, config, logging, bootstrap) runs once, then the command
//! handler writes its output to stdout. Diagnostics go through `tracing`.

use crate::analysis::AnalyzeError;
use crate::cli::args::STDIN_INPUT;
use crate::cli::bootstrap::{build_analyzer, ensure_infrastructure, open_knowledge_base};
use crate::cli::home::resolve_home;
use crate::cli::logging::init_logging;
use crate::cli::{Cli, Commands, Error, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_SUCCESS};
use crate::config::{load_dotenv, ConfigError, Settings, CONFIG_FILE, DOTENV_FILE};
use crate::records::RecordStore;
use anyhow::Context as _;
use buildsense_knowledge::{seed_if_empty, LocalCollection, Metadata, VectorStore};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Resolved home plus loaded settings
#[derive(Debug, Clone)]
pub struct Context {
    pub home: PathBuf,
    pub settings: Settings,
}

impl Context {
    /// Load `<home>/config.toml` (defaults when missing)
    pub fn load(home: PathBuf) -> crate::cli::Result<Self> {
        let settings = Settings::load(&home)?;
        Ok(Self { home, settings })
    }
}

/// Run the CLI and return the process exit code
pub fn run_cli(cli: Cli) -> ExitCode {
    let ctx = match setup(cli.home) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            return e.exit_code();
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(&ctx, &cli.command, &mut out) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

fn setup(home: Option<PathBuf>) -> crate::cli::Result<Context> {
    let home = resolve_home(home)?;
    let exported = load_dotenv(&home)?;
    let ctx = Context::load(home)?;
    let log_file = ctx.settings.log_file(&ctx.home);
    init_logging(&ctx.settings.logging.level, log_file.as_deref())?;
    if exported > 0 {
        debug!("Exported {} variables from {}", exported, DOTENV_FILE);
    }
    let status = ensure_infrastructure(&ctx.home, &ctx.settings)?;
    if !status.was_ready() {
        info!("Initialized home {}", ctx.home.display());
    }
    Ok(ctx)
}

/// Map a command error to an exit code
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<Error>() {
            return e.exit_code();
        }
        if cause.is::<ConfigError>() {
            return EXIT_CONFIG_ERROR;
        }
    }
    EXIT_FAILURE
}

/// Run one command against a prepared context
pub fn execute(ctx: &Context, command: &Commands, out: &mut dyn Write) -> anyhow::Result<()> {
    debug!("Dispatching {:?}", command);
    match command {
        Commands::Analyze {
            input,
            source,
            learn,
        } => cmd_analyze(ctx, input, source.as_deref(), *learn, out),
        Commands::Scan => cmd_scan(ctx, out),
        Commands::Ingest { file, meta } => cmd_ingest(ctx, file, meta, out),
        Commands::Search { query, top_k } => cmd_search(ctx, query, *top_k, out),
        Commands::Seed => cmd_seed(ctx, out),
        Commands::History => cmd_history(ctx, out),
        Commands::Status => cmd_status(ctx, out),
    }
}

fn cmd_analyze(
    ctx: &Context,
    input: &str,
    source: Option<&str>,
    learn: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let (log, default_source) = read_input(input)?;
    let source = source.map(str::to_string).unwrap_or(default_source);
    let mut analyzer = build_analyzer(&ctx.home, &ctx.settings)?;

    let result = match analyzer.analyze(&log, &source) {
        Ok(result) => result,
        Err(AnalyzeError::Persistence { result, source }) => {
            write_json(out, &result)?;
            return Err(anyhow::Error::new(source).context("analysis record was not saved"));
        }
        Err(e) => return Err(e).context("analysis failed"),
    };
    write_json(out, &result)?;

    if learn {
        match analyzer.learn(&result)? {
            Some(id) => info!("Knowledge base learned {}", id),
            None => info!("Nothing learned from this analysis"),
        }
    }
    Ok(())
}

fn cmd_scan(ctx: &Context, out: &mut dyn Write) -> anyhow::Result<()> {
    let analyzer = build_analyzer(&ctx.home, &ctx.settings)?;
    let dir = ctx.settings.logs_dir(&ctx.home);
    let entries = analyzer.scan(&dir, &ctx.settings.logs)?;

    if entries.is_empty() {
        writeln!(out, "No log files found in {}", dir.display())?;
        return Ok(());
    }

    let mut failed = 0;
    for entry in &entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.path.display().to_string());
        match &entry.outcome {
            Ok(result) => writeln!(
                out,
                "{}\t{}\t{:.2}\t{}",
                name, result.error_type, result.confidence, result.error_summary
            )?,
            Err(e) => {
                failed += 1;
                writeln!(out, "{}\tERROR\t{}", name, e)?;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} logs failed", failed, entries.len());
    }
    Ok(())
}

fn cmd_ingest(
    ctx: &Context,
    file: &Path,
    meta: &[(String, String)],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let metadata: Metadata = meta.iter().cloned().collect();

    let mut knowledge = open_knowledge_base(&ctx.home, &ctx.settings)?;
    let id = knowledge.ingest(&content, metadata)?;
    writeln!(out, "{}", id)?;
    Ok(())
}

fn cmd_search(
    ctx: &Context,
    query: &str,
    top_k: Option<usize>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let top_k = top_k.unwrap_or(ctx.settings.knowledge.top_k).max(1);
    let knowledge = open_knowledge_base(&ctx.home, &ctx.settings)?;
    let hits = knowledge.search(query, top_k)?;
    write_json(out, &hits)
}

fn cmd_seed(ctx: &Context, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut knowledge = open_knowledge_base(&ctx.home, &ctx.settings)?;
    let seeded = seed_if_empty(&mut knowledge)?;
    if seeded == 0 {
        writeln!(
            out,
            "Knowledge base already has {} documents, nothing seeded",
            knowledge.count()?
        )?;
    } else {
        writeln!(out, "Seeded {} documents", seeded)?;
    }
    Ok(())
}

fn cmd_history(ctx: &Context, out: &mut dyn Write) -> anyhow::Result<()> {
    let records = RecordStore::new(ctx.settings.reports_dir(&ctx.home));
    let paths = records.list()?;
    if paths.is_empty() {
        writeln!(out, "No analysis records in {}", records.dir().display())?;
        return Ok(());
    }

    for path in paths {
        let record = records
            .load(&path)
            .with_context(|| format!("unreadable record {}", path.display()))?;
        writeln!(
            out,
            "{}\t{}\t{:.2}\t{}\t{}",
            record.analyzed_at.format("%Y-%m-%d %H:%M:%S"),
            record.error_type,
            record.confidence,
            record.log_source,
            record.error_summary
        )?;
    }
    Ok(())
}

fn cmd_status(ctx: &Context, out: &mut dyn Write) -> anyhow::Result<()> {
    let settings = &ctx.settings;
    let config_path = ctx.home.join(CONFIG_FILE);
    let collection = LocalCollection::open(
        settings.knowledge_dir(&ctx.home),
        &settings.knowledge.collection,
    )?;
    let records = RecordStore::new(settings.reports_dir(&ctx.home)).list()?;

    writeln!(out, "home:       {}", ctx.home.display())?;
    writeln!(
        out,
        "config:     {} ({})",
        config_path.display(),
        if config_path.is_file() { "loaded" } else { "defaults" }
    )?;
    writeln!(
        out,
        "provider:   {} ({} at {})",
        settings.llm.provider.as_str(),
        settings.llm.model,
        settings.llm.base_url
    )?;
    writeln!(
        out,
        "embedder:   {} (dimension {})",
        settings.knowledge.embedder.kind.as_str(),
        settings.knowledge.embedder.dimension
    )?;
    writeln!(
        out,
        "knowledge:  {} ({} documents)",
        collection.path().display(),
        collection.count()?
    )?;
    writeln!(out, "logs:       {}", settings.logs_dir(&ctx.home).display())?;
    writeln!(
        out,
        "reports:    {} ({} records)",
        settings.reports_dir(&ctx.home).display(),
        records.len()
    )?;
    Ok(())
}

/// Read a log from a file or stdin, with its default source name
fn read_input(input: &str) -> anyhow::Result<(String, String)> {
    if input == STDIN_INPUT {
        let mut log = String::new();
        io::stdin()
            .read_to_string(&mut log)
            .context("failed to read log from stdin")?;
        return Ok((log, "stdin".to_string()));
    }

    let path = Path::new(input);
    let bytes = fs::read(path).with_context(|| format!("failed to read log {}", input))?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    Ok((String::from_utf8_lossy(&bytes).into_owned(), source))
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::AdapterError;

    #[test]
    fn test_exit_code_for_config_errors() {
        let err = anyhow::Error::new(Error::Bootstrap("no key".to_string()));
        assert_eq!(exit_code_for(&err), EXIT_CONFIG_ERROR);

        let err = anyhow::Error::new(ConfigError::Invalid("top_k".to_string()))
            .context("loading settings");
        assert_eq!(exit_code_for(&err), EXIT_CONFIG_ERROR);

        let err = anyhow::Error::new(Error::Adapter(AdapterError::Configuration(
            "missing key".to_string(),
        )));
        assert_eq!(exit_code_for(&err), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_exit_code_for_runtime_errors() {
        let err = anyhow::anyhow!("1 of 2 logs failed");
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);

        let err = anyhow::Error::new(Error::Io(io::Error::new(io::ErrorKind::Other, "disk")));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }
}

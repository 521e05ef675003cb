//! CLI integration tests
//!
//! Tests end-to-end CLI behavior:
//! - Home bootstrap and status
//! - analyze / scan / history with the offline stub provider
//! - ingest / search / seed against the on-disk knowledge collection
//! - Exit codes for configuration errors
//!
//! All tests run the real binary with `--home` pointing at a temp directory.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const STUB_CONFIG: &str = r#"
[llm]
provider = "stub"

[knowledge.embedder]
kind = "hashing"
dimension = 128
"#;

const NPM_LOG: &str = "> npm ci\nnpm ERR! code ETIMEDOUT\nnpm ERR! network request to https://registry.npmjs.org/vue failed\n";

// Test helper: home directory with the given config.toml
fn home_with_config(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("config.toml"), config).unwrap();
    temp
}

fn command(home: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildsense"));
    cmd.arg("--home").arg(home).args(args);
    for var in [
        "BUILDSENSE_HOME",
        "BUILDSENSE_LOG",
        "BUILDSENSE_API_KEY",
        "BUILDSENSE_BASE_URL",
        "BUILDSENSE_MODEL",
        "BUILDSENSE_LOG_LEVEL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    command(home, args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_status_bootstraps_home() {
    let home = home_with_config(STUB_CONFIG);
    let output = run(home.path(), &["status"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("provider:   stub"));
    assert!(text.contains("embedder:   hashing (dimension 128)"));
    assert!(text.contains("(0 documents)"));
    assert!(home.path().join("data/knowledge").is_dir());
    assert!(home.path().join("data/logs").is_dir());
    assert!(home.path().join("data/reports").is_dir());
}

#[test]
fn test_analyze_file_prints_result_and_records_it() {
    let home = home_with_config(STUB_CONFIG);
    let log = home.path().join("build-17.log");
    fs::write(&log, NPM_LOG).unwrap();

    let output = run(home.path(), &["analyze", log.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["error_type"], "other");
    assert!(!result["error_snippets"].as_array().unwrap().is_empty());
    // Knowledge base was seeded on first analysis
    assert_eq!(result["knowledge_references"].as_array().unwrap().len(), 3);
    let confidence = result["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert!(result.get("degraded").is_none());

    let history = run(home.path(), &["history"]);
    assert_eq!(history.status.code(), Some(0));
    let lines: Vec<String> = stdout(&history).lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("build-17.log"));
    assert!(lines[0].contains("other"));
}

#[test]
fn test_analyze_stdin_with_source_and_learn() {
    let home = home_with_config(STUB_CONFIG);
    let mut child = command(home.path(), &["analyze", "-", "--source", "ci-job-9", "--learn"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"Error: Permission denied (publickey)\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));

    let history = stdout(&run(home.path(), &["history"]));
    assert!(history.contains("ci-job-9"));

    // Six seeded documents plus the learned one
    let status = stdout(&run(home.path(), &["status"]));
    assert!(status.contains("(7 documents)"), "status: {}", status);
}

#[test]
fn test_ingest_then_search() {
    let home = home_with_config(STUB_CONFIG);
    let doc = home.path().join("gradle.md");
    let content = "Gradle daemon disappeared unexpectedly: raise org.gradle.jvmargs in gradle.properties";
    fs::write(&doc, content).unwrap();

    let ingest = run(
        home.path(),
        &["ingest", doc.to_str().unwrap(), "--meta", "source=wiki"],
    );
    assert_eq!(ingest.status.code(), Some(0), "stderr: {}", stderr(&ingest));
    assert!(stdout(&ingest).trim().starts_with("doc_"));

    let search = run(home.path(), &["search", content, "--top-k", "1"]);
    assert_eq!(search.status.code(), Some(0), "stderr: {}", stderr(&search));
    let hits: serde_json::Value = serde_json::from_str(&stdout(&search)).unwrap();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["content"], content);
    assert_eq!(hits[0]["metadata"]["source"], "wiki");
    assert_eq!(hits[0]["rank"], 1);
    assert!((hits[0]["similarity"].as_f64().unwrap() - 1.0).abs() < 1e-4);
}

#[test]
fn test_seed_only_when_empty() {
    let home = home_with_config(STUB_CONFIG);

    let first = run(home.path(), &["seed"]);
    assert_eq!(first.status.code(), Some(0));
    assert_eq!(stdout(&first).trim(), "Seeded 6 documents");

    let second = run(home.path(), &["seed"]);
    assert_eq!(second.status.code(), Some(0));
    assert!(stdout(&second).contains("already has 6 documents"));
}

#[test]
fn test_scan_reports_each_log() {
    let home = home_with_config(STUB_CONFIG);
    let logs = home.path().join("data/logs");
    fs::create_dir_all(&logs).unwrap();
    fs::write(logs.join("api.log"), NPM_LOG).unwrap();
    fs::write(logs.join("web.txt"), "FATAL ERROR: JavaScript heap out of memory\n").unwrap();
    fs::write(logs.join("README.md"), "not a log").unwrap();

    let output = run(home.path(), &["scan"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("api.log\tother\t"));
    assert!(lines[1].starts_with("web.txt\tother\t"));
}

#[test]
fn test_dotenv_in_home_feeds_settings() {
    let home = home_with_config(STUB_CONFIG);
    fs::write(
        home.path().join(".env"),
        "# local overrides\nBUILDSENSE_MODEL=\"model-from-dotenv\"\n",
    )
    .unwrap();

    let output = run(home.path(), &["status"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("(model-from-dotenv at "));

    // The shell environment wins over the file
    let output = command(home.path(), &["status"])
        .env("BUILDSENSE_MODEL", "model-from-shell")
        .output()
        .unwrap();
    assert!(stdout(&output).contains("(model-from-shell at "));
}

#[test]
fn test_dotenv_supplies_referenced_api_key() {
    let home = home_with_config(
        r#"
[llm]
provider = "openai"
api_key = "env:BUILDSENSE_TEST_DOTENV_KEY"
base_url = "http://127.0.0.1:9"
timeout_seconds = 2
max_retries = 0

[knowledge.embedder]
kind = "hashing"
dimension = 128
"#,
    );
    fs::write(home.path().join(".env"), "BUILDSENSE_TEST_DOTENV_KEY=sk-from-file\n").unwrap();
    let log = home.path().join("b.log");
    fs::write(&log, NPM_LOG).unwrap();

    // The key resolves, so the model call is attempted and degrades offline
    let output = command(home.path(), &["analyze", log.to_str().unwrap()])
        .env_remove("BUILDSENSE_TEST_DOTENV_KEY")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(!stderr(&output).contains("API key is empty"));
    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(result["error_summary"], "analysis failed");
}

#[test]
fn test_openai_without_key_exits_with_config_error() {
    let home = home_with_config(
        r#"
[llm]
provider = "openai"
api_key = "env:BUILDSENSE_TEST_UNSET_KEY"
"#,
    );
    let log = home.path().join("b.log");
    fs::write(&log, NPM_LOG).unwrap();

    let output = command(home.path(), &["analyze", log.to_str().unwrap()])
        .env_remove("BUILDSENSE_TEST_UNSET_KEY")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("API key is empty"));
    assert!(err.contains("BUILDSENSE_TEST_UNSET_KEY"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let home = home_with_config("[knowledge]\ntop_k = 0\n");
    let output = run(home.path(), &["status"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("top_k"));
}

#[test]
fn test_missing_home_exits_with_config_error() {
    let temp = TempDir::new().unwrap();
    let output = run(&temp.path().join("nowhere"), &["status"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("does not exist"));
}

#[test]
fn test_missing_log_file_is_runtime_failure() {
    let home = home_with_config(STUB_CONFIG);
    let output = run(home.path(), &["analyze", "absent.log"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to read log absent.log"));
}

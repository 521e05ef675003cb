//! Configuration Management
//!
//! `Settings` is read from `<home>/config.toml` (missing file ⇒ defaults),
//! then environment overrides are applied and the result is validated.
//!
//! ## Environment overrides
//!
//! - `BUILDSENSE_API_KEY` → `llm.api_key`
//! - `BUILDSENSE_BASE_URL` → `llm.base_url`
//! - `BUILDSENSE_MODEL` → `llm.model`
//! - `BUILDSENSE_LOG_LEVEL` → `logging.level`
//!
//! `<home>/.env` can supply any of these (and the variables named by
//! `env:NAME` keys); see [`load_dotenv`]. Variables already set in the
//! process environment take precedence over the file.
//!
//! Relative paths in the file resolve against the home directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Config file location: <home>/config.toml
pub const CONFIG_FILE: &str = "config.toml";

/// Environment file location: <home>/.env
pub const DOTENV_FILE: &str = ".env";

/// Prefix marking a value that is read from the environment
pub const ENV_PREFIX: &str = "env:";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Chat provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Any OpenAI-compatible endpoint
    OpenAi,
    /// Offline canned responses
    Stub,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Stub => "stub",
        }
    }
}

/// `[llm]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    /// Literal key, or `env:NAME`
    pub api_key: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            api_key: "env:DEEPSEEK_API_KEY".to_string(),
            temperature: 0.1,
            max_tokens: 2000,
            timeout_seconds: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

/// Embedder selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Local feature-hashing embedder, no network
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
}

impl EmbedderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedderKind::Hashing => "hashing",
            EmbedderKind::OpenAi => "openai",
        }
    }
}

/// `[knowledge.embedder]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderSettings {
    pub kind: EmbedderKind,
    pub dimension: usize,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Hashing,
            dimension: 384,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "env:OPENAI_API_KEY".to_string(),
        }
    }
}

/// `[knowledge]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeSettings {
    pub path: PathBuf,
    pub collection: String,
    pub top_k: usize,
    pub embedder: EmbedderSettings,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/knowledge"),
            collection: "build_solutions".to_string(),
            top_k: 3,
            embedder: EmbedderSettings::default(),
        }
    }
}

/// `[logs]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsSettings {
    pub input_dir: PathBuf,
    /// Extensions (with leading dot) picked up by `scan`
    pub supported_formats: Vec<String>,
}

impl Default for LogsSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/logs"),
            supported_formats: vec![".log".to_string(), ".txt".to_string()],
        }
    }
}

impl LogsSettings {
    /// Whether `path` has one of the supported extensions (case-insensitive)
    pub fn is_supported(&self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(".{}", ext.to_lowercase()),
            None => return false,
        };
        self.supported_formats
            .iter()
            .any(|f| f.to_lowercase() == ext)
    }
}

/// `[reports]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsSettings {
    pub output_dir: PathBuf,
}

impl Default for ReportsSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/reports"),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// tracing filter directive (`info`, `buildsense=debug`, ...)
    pub level: String,
    /// Log to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub knowledge: KnowledgeSettings,
    pub logs: LogsSettings,
    pub reports: ReportsSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load `<home>/config.toml`, apply environment overrides, validate
    pub fn load(home: &Path) -> Result<Self> {
        Self::load_with_env(home, |name| std::env::var(name).ok())
    }

    /// [`Settings::load`] with an explicit environment lookup
    pub fn load_with_env<F>(home: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = home.join(CONFIG_FILE);
        let mut settings = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let settings = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
            info!("Loaded configuration from {}", path.display());
            settings
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        settings.apply_env_overrides(env);
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render settings as TOML text
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `BUILDSENSE_*` overrides
    pub fn apply_env_overrides<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = env("BUILDSENSE_API_KEY") {
            self.llm.api_key = api_key;
            debug!("Applied env override for API key");
        }
        if let Some(base_url) = env("BUILDSENSE_BASE_URL") {
            self.llm.base_url = base_url;
            debug!("Applied env override for base URL");
        }
        if let Some(model) = env("BUILDSENSE_MODEL") {
            self.llm.model = model;
            debug!("Applied env override for model");
        }
        if let Some(level) = env("BUILDSENSE_LOG_LEVEL") {
            self.logging.level = level;
            debug!("Applied env override for log level");
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.knowledge.top_k == 0 {
            return Err(ConfigError::Invalid(
                "knowledge.top_k must be at least 1".to_string(),
            ));
        }
        if self.knowledge.embedder.dimension == 0 {
            return Err(ConfigError::Invalid(
                "knowledge.embedder.dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Knowledge directory, resolved against `home`
    pub fn knowledge_dir(&self, home: &Path) -> PathBuf {
        resolve_path(home, &self.knowledge.path)
    }

    /// Log input directory, resolved against `home`
    pub fn logs_dir(&self, home: &Path) -> PathBuf {
        resolve_path(home, &self.logs.input_dir)
    }

    /// Report output directory, resolved against `home`
    pub fn reports_dir(&self, home: &Path) -> PathBuf {
        resolve_path(home, &self.reports.output_dir)
    }

    /// Log file, resolved against `home`
    pub fn log_file(&self, home: &Path) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|f| resolve_path(home, f))
    }
}

/// Join a relative path onto `home`; absolute paths are kept
pub fn resolve_path(home: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

/// Resolve an `env:NAME` reference
///
/// Returns the literal value when there is no prefix, and an empty string
/// when the referenced variable is unset.
pub fn resolve_secret<F>(value: &str, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match value.strip_prefix(ENV_PREFIX) {
        Some(name) => env(name).unwrap_or_default(),
        None => value.to_string(),
    }
}

/// Parse `KEY=VALUE` lines of an environment file
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed,
/// and values may be single- or double-quoted. Unquoted values end at ` #`.
/// Malformed lines are logged and ignored. Later duplicates win.
pub fn parse_dotenv(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line
            .strip_prefix("export ")
            .map(str::trim_start)
            .unwrap_or(line);
        let (key, raw) = match line.split_once('=') {
            Some((key, raw)) => (key.trim(), raw),
            None => {
                warn!("Ignoring {} line {}: expected KEY=VALUE", DOTENV_FILE, index + 1);
                continue;
            }
        };
        let value = dotenv_value(raw);
        if !is_env_name(key) || value.contains('\0') {
            warn!("Ignoring {} line {}: invalid variable", DOTENV_FILE, index + 1);
            continue;
        }
        vars.insert(key.to_string(), value);
    }
    vars
}

fn dotenv_value(raw: &str) -> String {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return rest[..end].to_string();
            }
        }
    }
    match raw.find(" #") {
        Some(pos) => raw[..pos].trim_end().to_string(),
        None => raw.to_string(),
    }
}

fn is_env_name(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        }
        _ => false,
    }
}

/// Export `<home>/.env` into the process environment
///
/// Variables already present in the environment are left untouched. Returns
/// how many variables were exported; a missing file exports nothing. Call it
/// before any thread is spawned.
pub fn load_dotenv(home: &Path) -> Result<usize> {
    let path = home.join(DOTENV_FILE);
    if !path.is_file() {
        return Ok(0);
    }
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    let mut exported = 0;
    for (key, value) in parse_dotenv(&content) {
        if std::env::var_os(&key).is_some() {
            debug!("{} already set, ignoring {} entry", key, DOTENV_FILE);
            continue;
        }
        std::env::set_var(&key, value);
        exported += 1;
    }
    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.llm.provider, Provider::OpenAi);
        assert_eq!(s.llm.model, "deepseek-chat");
        assert_eq!(s.llm.max_tokens, 2000);
        assert_eq!(s.knowledge.top_k, 3);
        assert_eq!(s.knowledge.collection, "build_solutions");
        assert_eq!(s.knowledge.embedder.dimension, 384);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let s = Settings::load_with_env(temp.path(), no_env).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[llm]\nprovider = \"stub\"\n\n[knowledge]\ntop_k = 5\n",
        )
        .unwrap();
        let s = Settings::load_with_env(temp.path(), no_env).unwrap();
        assert_eq!(s.llm.provider, Provider::Stub);
        assert_eq!(s.llm.temperature, 0.1);
        assert_eq!(s.knowledge.top_k, 5);
        assert_eq!(s.knowledge.collection, "build_solutions");
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let vars: HashMap<&str, &str> = [
            ("BUILDSENSE_API_KEY", "sk-env"),
            ("BUILDSENSE_MODEL", "deepseek-reasoner"),
            ("BUILDSENSE_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();
        let s = Settings::load_with_env(temp.path(), |name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(s.llm.api_key, "sk-env");
        assert_eq!(s.llm.model, "deepseek-reasoner");
        assert_eq!(s.llm.base_url, "https://api.deepseek.com");
        assert_eq!(s.logging.level, "debug");
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut s = Settings::default();
        s.llm.temperature = 2.5;
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(_))));

        let mut s = Settings::default();
        s.knowledge.top_k = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.llm.max_tokens = 0;
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.knowledge.embedder.dimension = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[llm\nprovider=").unwrap();
        let err = Settings::load_with_env(temp.path(), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut s = Settings::default();
        s.logging.file = Some(PathBuf::from("data/buildsense.log"));
        let text = s.to_toml().unwrap();
        assert_eq!(Settings::from_toml(&text).unwrap(), s);
    }

    #[test]
    fn test_path_resolution() {
        let home = Path::new("/srv/buildsense");
        let mut s = Settings::default();
        assert_eq!(s.knowledge_dir(home), home.join("data/knowledge"));
        s.reports.output_dir = PathBuf::from("/var/reports");
        assert_eq!(s.reports_dir(home), PathBuf::from("/var/reports"));
        assert_eq!(s.log_file(home), None);
    }

    #[test]
    fn test_supported_formats() {
        let logs = LogsSettings::default();
        assert!(logs.is_supported(Path::new("build.log")));
        assert!(logs.is_supported(Path::new("BUILD.TXT")));
        assert!(!logs.is_supported(Path::new("build.json")));
        assert!(!logs.is_supported(Path::new("Makefile")));
    }

    #[test]
    fn test_resolve_secret() {
        let env = |name: &str| (name == "KEY").then(|| "secret".to_string());
        assert_eq!(resolve_secret("env:KEY", env), "secret");
        assert_eq!(resolve_secret("env:MISSING", env), "");
        assert_eq!(resolve_secret("literal", env), "literal");
    }

    #[test]
    fn test_parse_dotenv_lines() {
        let vars = parse_dotenv(
            "# deepseek account\n\
             DEEPSEEK_API_KEY=sk-file\n\
             export BUILDSENSE_MODEL = \"deepseek-reasoner\"\n\
             BUILDSENSE_LOG_LEVEL=debug # verbose\n\
             QUOTED='a # b'\n\
             not a pair\n\
             1BAD=x\n\
             DEEPSEEK_API_KEY=sk-later\n",
        );
        assert_eq!(vars["DEEPSEEK_API_KEY"], "sk-later");
        assert_eq!(vars["BUILDSENSE_MODEL"], "deepseek-reasoner");
        assert_eq!(vars["BUILDSENSE_LOG_LEVEL"], "debug");
        assert_eq!(vars["QUOTED"], "a # b");
        assert_eq!(vars.len(), 4);
    }

    #[test]
    fn test_load_dotenv_keeps_existing_variables() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_dotenv(temp.path()).unwrap(), 0);

        std::env::set_var("BUILDSENSE_DOTENV_TEST_SET", "from-shell");
        std::env::remove_var("BUILDSENSE_DOTENV_TEST_NEW");
        fs::write(
            temp.path().join(DOTENV_FILE),
            "BUILDSENSE_DOTENV_TEST_SET=from-file\nBUILDSENSE_DOTENV_TEST_NEW=from-file\n",
        )
        .unwrap();

        assert_eq!(load_dotenv(temp.path()).unwrap(), 1);
        assert_eq!(
            std::env::var("BUILDSENSE_DOTENV_TEST_SET").unwrap(),
            "from-shell"
        );
        assert_eq!(
            std::env::var("BUILDSENSE_DOTENV_TEST_NEW").unwrap(),
            "from-file"
        );
        assert_eq!(
            resolve_secret("env:BUILDSENSE_DOTENV_TEST_NEW", |n| std::env::var(n).ok()),
            "from-file"
        );
    }
}

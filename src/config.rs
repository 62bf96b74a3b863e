//! Application configuration: `config/ridechat.yaml`.
//!
//! The file is located via `RIDECHAT_PROJECT_ROOT` or by walking upward from
//! a start directory. String values may reference environment variables as
//! `${VAR}` or `${VAR:-default}`; defaults starting with `~` are expanded to
//! the home directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assistant::similarity::DEFAULT_THRESHOLD;
use crate::inference::config::ProvidersConfig;
use crate::inference::errors::InferenceError;
use crate::inference::style::Style;

/// Path of the config file relative to the project root.
pub const CONFIG_FILE: &str = "config/ridechat.yaml";

/// Env var pointing at the project root.
pub const PROJECT_ROOT_ENV: &str = "RIDECHAT_PROJECT_ROOT";

// ─── Config Types ────────────────────────────────────────────────────────────

/// Top-level structure of `config/ridechat.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Style used when a caller does not pick one.
    #[serde(default)]
    pub default_style: Style,
    /// `providers` and `fallback_chain`.
    #[serde(flatten)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dialogue tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct DialogueConfig {
    /// Minimum (exclusive) similarity for a corpus hit.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Where the training corpus comes from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorpusConfig {
    /// SQLite database path. Without it the corpus is read from `seed_file`
    /// only and nothing learned is persisted.
    pub database: Option<String>,
    /// YAML file of curated examples, appended to the database on startup.
    pub seed_file: Option<String>,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "ridechat=info,warn".into()
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate `config/ridechat.yaml`.
///
/// Checks `RIDECHAT_PROJECT_ROOT` first, then searches upward from `start`.
pub fn find_config_path(start: &Path) -> Result<PathBuf, InferenceError> {
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let candidate = PathBuf::from(&root).join(CONFIG_FILE);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(InferenceError::ConfigError {
        reason: format!("could not find {CONFIG_FILE}"),
    })
}

/// Read, interpolate and parse a config file.
pub fn load_config(path: &Path) -> Result<AppConfig, InferenceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_config(&raw)
}

/// Parse config text after environment interpolation.
pub fn parse_config(raw: &str) -> Result<AppConfig, InferenceError> {
    let interpolated = interpolate_env_vars(raw);
    serde_yaml::from_str(&interpolated).map_err(|e| InferenceError::ConfigError {
        reason: format!("failed to parse config: {e}"),
    })
}

impl AppConfig {
    /// Resolve a relative corpus path against the config file's directory's
    /// parent (the project root).
    pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
        let path = PathBuf::from(expand_tilde(value));
        if path.is_absolute() {
            return path;
        }
        config_path
            .parent()
            .and_then(Path::parent)
            .map(|root| root.join(&path))
            .unwrap_or(path)
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve `VAR` or `VAR:-default`. Unset without a default is empty.
fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => std::env::var(name).unwrap_or_else(|_| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;

use crate::due::DEFAULT_SOON_THRESHOLD_DAYS;

static DEFAULT_DB_NAME: &str = "tdl.sqlite3";
static DEFAULT_LOG_NAME: &str = "tdl.log";
pub static DEFAULT_API_URL: &str = "http://localhost:3000";

static ENV_DATA_DIR: &str = "TDL_DATA_DIR";
static ENV_API_URL: &str = "TDL_API_URL";
static ENV_API_TOKEN: &str = "TDL_API_TOKEN";
static ENV_SOON_DAYS: &str = "TDL_SOON_DAYS";
static ENV_OFFLINE: &str = "TDL_OFFLINE";
static ENV_TIMEOUT_SECS: &str = "TDL_TIMEOUT_SECS";
static ENV_REQUIRE_DUE_DATE: &str = "TDL_REQUIRE_DUE_DATE";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "tdl-cli", "tdl"));

/// Where tasks and categories live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// PostgREST-style HTTP API.
    Rest,
    /// SQLite file in the data directory.
    Local,
}

/// Values supplied on the command line; each one wins over its environment
/// variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub offline: bool,
    pub soon_threshold_days: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    data_dir: PathBuf,
    db_path: PathBuf,
    log_path: PathBuf,
    api_url: String,
    api_token: Option<String>,
    backend: BackendKind,
    soon_threshold_days: i64,
    require_due_date: bool,
    request_timeout: Option<Duration>,
}

impl AppConfig {
    /// Construct [`AppConfig`] from command-line overrides, the `TDL_*`
    /// environment variables, and platform defaults, creating the data
    /// directory when missing.
    pub fn discover(overrides: ConfigOverrides) -> Result<Self> {
        Self::discover_with(overrides, |key| env::var(key).ok())
    }

    /// [`discover`](Self::discover) with an injectable environment lookup.
    pub fn discover_with<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = resolve_data_dir(overrides.data_dir, &lookup)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }

        let mut config = Self::from_data_dir(data_dir)?;

        let api_url = overrides
            .api_url
            .or_else(|| lookup(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        config.api_url = normalize_api_url(&api_url)?;
        config.api_token = lookup(ENV_API_TOKEN).filter(|token| !token.trim().is_empty());

        let offline = overrides.offline || parse_flag(ENV_OFFLINE, lookup(ENV_OFFLINE))?;
        if offline {
            config.backend = BackendKind::Local;
        }

        config.soon_threshold_days = match overrides.soon_threshold_days {
            Some(days) => days,
            None => match lookup(ENV_SOON_DAYS) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a whole number of days", ENV_SOON_DAYS))?,
                None => DEFAULT_SOON_THRESHOLD_DAYS,
            },
        };
        if config.soon_threshold_days < 0 {
            bail!("The due-soon threshold cannot be negative");
        }

        config.require_due_date =
            parse_flag(ENV_REQUIRE_DUE_DATE, lookup(ENV_REQUIRE_DUE_DATE))?;

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Construct [`AppConfig`] directly from a resolved data directory, with
    /// every other setting at its default.
    pub fn from_data_dir(data_dir: PathBuf) -> Result<Self> {
        let db_path = data_dir.join(DEFAULT_DB_NAME);
        let log_path = data_dir.join(DEFAULT_LOG_NAME);
        Ok(Self {
            data_dir,
            db_path,
            log_path,
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            backend: BackendKind::Rest,
            soon_threshold_days: DEFAULT_SOON_THRESHOLD_DAYS,
            require_due_date: false,
            request_timeout: None,
        })
    }

    /// Switch to the offline SQLite backend.
    pub fn offline(mut self) -> Self {
        self.backend = BackendKind::Local;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn soon_threshold_days(&self) -> i64 {
        self.soon_threshold_days
    }

    pub fn require_due_date(&self) -> bool {
        self.require_due_date
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

fn normalize_api_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("API URL '{}' must start with http:// or https://", raw.trim());
    }
    Ok(trimmed.to_string())
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{} must be true or false, got '{}'", key, other),
    }
}

fn resolve_data_dir<F>(data_dir_override: Option<PathBuf>, lookup: &F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Some(env_dir) = lookup(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if cfg!(debug_assertions) {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let dev_dir = manifest_dir.join("..").join("..").join("tmp").join("dev-tdl");
        return Ok(dev_dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(base) = BaseDirs::new() {
            return Ok(base.home_dir().join(".tdl"));
        }
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".tdl"));
    }

    Ok(env::current_dir()?.join(".tdl"))
}

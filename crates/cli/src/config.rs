//! System configuration
//!
//! Layering, lowest to highest:
//! 1. Built-in defaults
//! 2. TOML config file (`--config`, `SGW_REFRESH_CONFIG`, or the per-user default)
//! 3. Environment overrides (`REFRESH_DELAY_SECONDS`, `QUEUE_URL`, `LOG_LEVEL`)

use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use debouncer::FilterConfig;
use refresh_core::DebounceWindow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "SGW_REFRESH_CONFIG";
pub const REFRESH_DELAY_ENV: &str = "REFRESH_DELAY_SECONDS";
pub const QUEUE_URL_ENV: &str = "QUEUE_URL";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Longest delay the queue accepts
pub const MAX_WINDOW_SECS: u64 = 900;

const APP_DIR: &str = "sgw-refresh";
const FILE_SCHEME: &str = "file://";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Every configuration key, in display order
pub const KEYS: &[&str] = &[
    "debounce.window_secs",
    "debounce.internal_actor_markers",
    "queue.url",
    "table.path",
    "gateway.inventory",
    "log.level",
    "log.file",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub debounce: DebounceConfig,
    pub queue: QueueConfig,
    pub table: TableConfig,
    pub gateway: GatewayConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Debounce window; also the delay applied to each trigger
    pub window_secs: u64,
    /// Principal substrings whose changes are ignored
    pub internal_actor_markers: Vec<String>,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            internal_actor_markers: FilterConfig::default().internal_actor_markers,
        }
    }
}

impl DebounceConfig {
    pub fn window(&self) -> DebounceWindow {
        DebounceWindow::from_secs(self.window_secs)
    }

    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            internal_actor_markers: self.internal_actor_markers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Delay queue location; only `file://` spools are supported locally
    pub url: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: format!("{}{}", FILE_SCHEME, data_dir().join("queue").display()),
        }
    }
}

impl QueueConfig {
    /// Spool directory named by the queue URL
    pub fn spool_path(&self) -> Result<PathBuf> {
        let url = self.url.trim();
        if let Some(path) = url.strip_prefix(FILE_SCHEME) {
            return Ok(PathBuf::from(path));
        }
        if url.contains("://") {
            anyhow::bail!(
                "Unsupported queue URL '{}': only {} spools are supported",
                url,
                FILE_SCHEME
            );
        }
        Ok(PathBuf::from(url))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub path: PathBuf,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("table"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Share inventory file
    pub inventory: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            inventory: config_dir().join("inventory.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Directory for daily rolling log files; stderr when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Environment values layered over the file
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub refresh_delay_secs: Option<String>,
    pub queue_url: Option<String>,
    pub log_level: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            refresh_delay_secs: non_empty_var(REFRESH_DELAY_ENV),
            queue_url: non_empty_var(QUEUE_URL_ENV),
            log_level: non_empty_var(LOG_LEVEL_ENV),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl SystemConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_SECS).contains(&self.debounce.window_secs) {
            anyhow::bail!(
                "debounce.window_secs must be between 1 and {} (got {})",
                MAX_WINDOW_SECS,
                self.debounce.window_secs
            );
        }

        // An empty marker would match every principal
        if self
            .debounce
            .internal_actor_markers
            .iter()
            .any(|m| m.trim().is_empty())
        {
            anyhow::bail!("debounce.internal_actor_markers must not contain empty strings");
        }

        if self.queue.url.trim().is_empty() {
            anyhow::bail!("queue.url must not be empty");
        }
        let spool = self.queue.spool_path()?;
        if spool == self.table.path {
            anyhow::bail!(
                "queue.url and table.path must name different directories ({})",
                spool.display()
            );
        }

        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            anyhow::bail!(
                "log.level must be one of {} (got '{}')",
                LOG_LEVELS.join(", "),
                self.log.level
            );
        }

        Ok(())
    }

    /// Render a single key for display
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "debounce.window_secs" => self.debounce.window_secs.to_string(),
            "debounce.internal_actor_markers" => self.debounce.internal_actor_markers.join(","),
            "queue.url" => self.queue.url.clone(),
            "table.path" => self.table.path.display().to_string(),
            "gateway.inventory" => self.gateway.inventory.display().to_string(),
            "log.level" => self.log.level.clone(),
            "log.file" => self
                .log
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }
}

/// Per-user config directory for sgw-refresh
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Per-user data directory holding the local table and spool
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Config file to read, and whether it must exist
///
/// An explicitly named file (flag or environment) is required; the per-user
/// default is optional.
pub fn config_source(explicit: Option<&Path>) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (path.to_path_buf(), true);
    }
    if let Some(path) = non_empty_var(CONFIG_PATH_ENV) {
        return (PathBuf::from(path), true);
    }
    (config_dir().join("config.toml"), false)
}

/// Path of the config file in effect
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    config_source(explicit).0
}

/// Load configuration from the file in effect and the process environment
pub fn load(explicit: Option<&Path>) -> Result<SystemConfig> {
    let (path, required) = config_source(explicit);
    load_from(&path, required, &EnvOverrides::from_env())
}

/// Load configuration from `path` with the given overrides
pub fn load_from(path: &Path, required: bool, env: &EnvOverrides) -> Result<SystemConfig> {
    let mut builder = Config::builder().add_source(
        File::from(path)
            .format(FileFormat::Toml)
            .required(required),
    );

    if let Some(raw) = &env.refresh_delay_secs {
        let secs: i64 = raw.trim().parse().with_context(|| {
            format!(
                "{} must be a whole number of seconds (got '{}')",
                REFRESH_DELAY_ENV, raw
            )
        })?;
        if secs < 0 {
            anyhow::bail!("{} must not be negative (got {})", REFRESH_DELAY_ENV, secs);
        }
        builder = builder.set_override("debounce.window_secs", secs)?;
    }
    if let Some(url) = &env.queue_url {
        builder = builder.set_override("queue.url", url.trim())?;
    }
    if let Some(level) = &env.log_level {
        builder = builder.set_override("log.level", level.trim())?;
    }

    let config: SystemConfig = builder
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?
        .try_deserialize()
        .context("Invalid configuration")?;

    config.validate()?;
    Ok(config)
}

/// Write configuration to `path`, creating parent directories
pub fn save(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, rendered)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}

/// Create a default config file if none exists; returns whether one was written
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save(&SystemConfig::default(), path)?;
    Ok(true)
}

/// Annotated example configuration
pub fn example_config() -> &'static str {
    r#"# sgw-refresh configuration

[debounce]
# Debounce window in seconds (1-900). Also the delay applied to each
# refresh trigger. Overridden by REFRESH_DELAY_SECONDS.
window_secs = 60
# Changes made by principals containing any of these substrings are ignored
internal_actor_markers = ["StorageGateway"]

[queue]
# Delay queue spool directory. Overridden by QUEUE_URL.
url = "file:///var/lib/sgw-refresh/queue"

[table]
# Debounce/cache table directory
path = "/var/lib/sgw-refresh/table"

[gateway]
# Share inventory (TOML list of [[shares]] with arn, type, location)
inventory = "/etc/sgw-refresh/inventory.toml"

[log]
# trace, debug, info, warn, error or off. Overridden by LOG_LEVEL;
# RUST_LOG takes precedence over both.
level = "info"
# Write daily rolling log files to this directory instead of stderr
# file = "/var/log/sgw-refresh"
"#
}

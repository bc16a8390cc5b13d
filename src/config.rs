use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Format used for the generator reference instant and fabricated timestamps
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub attachments: AttachmentsConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address of the intake backend (no trailing slash needed)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout applied to every request (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    /// Per-file size ceiling in bytes (default: 10 MiB)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Extensions shown as accepted in the file hint. Not enforced.
    #[serde(default = "default_suggested_extensions")]
    pub suggested_extensions: Vec<String>,
}

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_suggested_extensions() -> Vec<String> {
    [
        "png", "jpg", "jpeg", "gif", "webp", "bmp", "svg", "pdf", "doc", "docx", "xls", "xlsx",
        "txt",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            suggested_extensions: default_suggested_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Event poll interval for the TUI loop
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate_ms: u64,
    /// How long a status message stays visible (default: 5)
    #[serde(default = "default_message_ttl")]
    pub message_ttl_secs: u64,
    /// Pause between contact creation and the ticket step (default: 1000)
    #[serde(default = "default_advance_delay")]
    pub advance_delay_ms: u64,
}

fn default_refresh_rate() -> u64 {
    250
}

fn default_message_ttl() -> u64 {
    5
}

fn default_advance_delay() -> u64 {
    1000
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: default_refresh_rate(),
            message_ttl_secs: default_message_ttl(),
            advance_delay_ms: default_advance_delay(),
        }
    }
}

impl UiConfig {
    pub fn message_ttl(&self) -> Duration {
        Duration::from_secs(self.message_ttl_secs)
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

/// Synthetic ticket generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Local timestamp the fabricated ticket ages are measured back from
    #[serde(default = "default_reference_instant")]
    pub reference_instant: String,
}

fn default_reference_instant() -> String {
    "2026-01-13T10:00:00".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            reference_instant: default_reference_instant(),
        }
    }
}

impl GeneratorConfig {
    pub fn reference(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.reference_instant, LOCAL_TIMESTAMP_FORMAT)
            .with_context(|| {
                format!(
                    "Invalid generator.reference_instant '{}' (expected YYYY-MM-DDTHH:MM:SS)",
                    self.reference_instant
                )
            })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for logs and local state
    #[serde(default = "default_state_path")]
    pub state: String,
}

fn default_state_path() -> String {
    ".intake".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state: default_state_path(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".intake/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so intake works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/intake/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("intake").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. INTAKE__API__BASE_URL
        builder = builder.add_source(
            config::Environment::with_prefix("INTAKE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to .intake/config.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::local_config_path())
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            attachments: AttachmentsConfig::default(),
            ui: UiConfig::default(),
            generator: GeneratorConfig::default(),
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

//! System configuration stored as TOML in the user's config directory
//!
//! Location: `<config_dir>/axiom/config.toml`. A missing file means defaults.
//! `AXIOM_URL` and `AXIOM_ANON_KEY` override the backend section at load time
//! without being written back.

use anyhow::{Context, Result};
use app::AppOptions;
use autosave::AutosaveConfig;
use remote::{RestConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Every key accepted by `axiom config get|set`
pub const KEYS: &[&str] = &[
    "backend.url",
    "backend.anon_key",
    "backend.request_timeout_ms",
    "autosave.project_quiet_ms",
    "autosave.settings_quiet_ms",
    "autosave.saved_display_ms",
    "signup.max_attempts",
    "signup.initial_backoff_ms",
    "signup.max_backoff_ms",
    "logging.level",
    "logging.file",
];

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub backend: BackendConfig,
    pub autosave: AutosaveSection,
    pub signup: SignupSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Service URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub anon_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSection {
    pub project_quiet_ms: u64,
    pub settings_quiet_ms: u64,
    /// 0 keeps "Changes saved" until the next edit
    pub saved_display_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupSection {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Daily-rolling log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            request_timeout_ms: 15_000,
        }
    }
}

impl Default for AutosaveSection {
    fn default() -> Self {
        Self {
            project_quiet_ms: 3000,
            settings_quiet_ms: 500,
            saved_display_ms: 2000,
        }
    }
}

impl Default for SignupSection {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl SystemConfig {
    /// Check every value is within its accepted range
    pub fn validate(&self) -> Result<()> {
        let timeout = self.backend.request_timeout_ms;
        if !(1000..=120_000).contains(&timeout) {
            anyhow::bail!("backend.request_timeout_ms must be 1000-120000 (got {})", timeout);
        }
        if !self.backend.url.is_empty()
            && !(self.backend.url.starts_with("http://") || self.backend.url.starts_with("https://"))
        {
            anyhow::bail!("backend.url must start with http:// or https://");
        }

        for (key, value) in [
            ("autosave.project_quiet_ms", self.autosave.project_quiet_ms),
            ("autosave.settings_quiet_ms", self.autosave.settings_quiet_ms),
        ] {
            if !(100..=60_000).contains(&value) {
                anyhow::bail!("{} must be 100-60000 (got {})", key, value);
            }
        }
        if self.autosave.saved_display_ms > 60_000 {
            anyhow::bail!(
                "autosave.saved_display_ms must be 0-60000 (got {})",
                self.autosave.saved_display_ms
            );
        }

        if !(1..=50).contains(&self.signup.max_attempts) {
            anyhow::bail!("signup.max_attempts must be 1-50 (got {})", self.signup.max_attempts);
        }
        if self.signup.initial_backoff_ms == 0 {
            anyhow::bail!("signup.initial_backoff_ms must be positive");
        }
        if self.signup.initial_backoff_ms > self.signup.max_backoff_ms {
            anyhow::bail!("signup.initial_backoff_ms must not exceed signup.max_backoff_ms");
        }

        if !LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {} (got '{}')",
                LEVELS.join(", "),
                self.logging.level
            );
        }
        Ok(())
    }

    /// Read a value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "backend.url" => self.backend.url.clone(),
            "backend.anon_key" => self.backend.anon_key.clone(),
            "backend.request_timeout_ms" => self.backend.request_timeout_ms.to_string(),
            "autosave.project_quiet_ms" => self.autosave.project_quiet_ms.to_string(),
            "autosave.settings_quiet_ms" => self.autosave.settings_quiet_ms.to_string(),
            "autosave.saved_display_ms" => self.autosave.saved_display_ms.to_string(),
            "signup.max_attempts" => self.signup.max_attempts.to_string(),
            "signup.initial_backoff_ms" => self.signup.initial_backoff_ms.to_string(),
            "signup.max_backoff_ms" => self.signup.max_backoff_ms.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.file" => self
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'axiom config list' to see available keys.",
                key
            ),
        };
        Ok(value)
    }

    /// Set a value by dotted key (not validated; call `validate` afterwards)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let millis = |value: &str| -> Result<u64> {
            value
                .parse()
                .context("Invalid value: must be a non-negative integer (milliseconds)")
        };

        match key {
            "backend.url" => self.backend.url = value.trim_end_matches('/').to_string(),
            "backend.anon_key" => self.backend.anon_key = value.to_string(),
            "backend.request_timeout_ms" => self.backend.request_timeout_ms = millis(value)?,
            "autosave.project_quiet_ms" => self.autosave.project_quiet_ms = millis(value)?,
            "autosave.settings_quiet_ms" => self.autosave.settings_quiet_ms = millis(value)?,
            "autosave.saved_display_ms" => self.autosave.saved_display_ms = millis(value)?,
            "signup.max_attempts" => {
                self.signup.max_attempts = value
                    .parse()
                    .context("Invalid value: must be a positive integer")?;
            }
            "signup.initial_backoff_ms" => self.signup.initial_backoff_ms = millis(value)?,
            "signup.max_backoff_ms" => self.signup.max_backoff_ms = millis(value)?,
            "logging.level" => self.logging.level = value.to_ascii_lowercase(),
            "logging.file" => {
                self.logging.file = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'axiom config list' to see available keys.",
                key
            ),
        }
        Ok(())
    }

    /// Timing options for the services
    pub fn app_options(&self) -> AppOptions {
        let saved_display = match self.autosave.saved_display_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        AppOptions {
            project_autosave: AutosaveConfig {
                quiet_period: Duration::from_millis(self.autosave.project_quiet_ms),
                saved_display,
            },
            settings_autosave: AutosaveConfig {
                quiet_period: Duration::from_millis(self.autosave.settings_quiet_ms),
                saved_display,
            },
            signup_retry: RetryPolicy {
                max_attempts: self.signup.max_attempts,
                initial_backoff: Duration::from_millis(self.signup.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.signup.max_backoff_ms),
            },
        }
    }

    /// Connection settings for the HTTP client
    pub fn rest_config(&self) -> Result<RestConfig> {
        if self.backend.url.is_empty() || self.backend.anon_key.is_empty() {
            anyhow::bail!(
                "Backend not configured. Run 'axiom config set backend.url <url>' and \
                 'axiom config set backend.anon_key <key>', or set AXIOM_URL and AXIOM_ANON_KEY."
            );
        }
        Ok(RestConfig {
            url: self.backend.url.clone(),
            anon_key: self.backend.anon_key.clone(),
            timeout: Duration::from_millis(self.backend.request_timeout_ms),
        })
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("AXIOM_URL") {
            self.backend.url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var("AXIOM_ANON_KEY") {
            self.backend.anon_key = key;
        }
    }
}

/// `<config_dir>/axiom`
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("axiom"))
}

pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Directory of the local cache database
pub fn cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("axiom"))
}

/// Load the config file with environment overrides applied
pub fn load() -> Result<SystemConfig> {
    let mut config = load_file()?;
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load the config file as stored, without environment overrides
pub fn load_file() -> Result<SystemConfig> {
    let path = config_file_path().context("Could not determine config file path")?;
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the default config if no file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save_to(&SystemConfig::default(), &path)?;
    }
    Ok(path)
}

pub fn example_config() -> String {
    r#"# Axiom configuration
# Location: ~/.config/axiom/config.toml (Linux)

[backend]
url = "https://your-project.supabase.co"
anon_key = "public-anon-key"
request_timeout_ms = 15000

[autosave]
# Quiet period after the last keystroke on the project settings page
project_quiet_ms = 3000
# Quiet period after the last toggle on the settings page
settings_quiet_ms = 500
# How long "Changes saved" stays up (0 = until the next edit)
saved_display_ms = 2000

[signup]
# Waiting for the profile row created after signup
max_attempts = 10
initial_backoff_ms = 250
max_backoff_ms = 4000

[logging]
level = "info"
# file = "/var/log/axiom/axiom.log"
"#
    .to_string()
}

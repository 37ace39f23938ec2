//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the zenith data directory.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tasks configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Simulated sync delay used by refresh
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
}

fn default_refresh_delay_ms() -> u64 {
    1000
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: default_refresh_delay_ms(),
        }
    }
}

impl TasksConfig {
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Simulated handshake delay used by login
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,

    /// Probability that a login attempt fails
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Rewrite a stored identity's name and email to the profile on startup
    #[serde(default = "default_true")]
    pub normalize_profile_on_load: bool,

    /// Demo identity handed out by login
    #[serde(default)]
    pub profile: ProfileConfig,
}

fn default_login_delay_ms() -> u64 {
    1500
}

fn default_failure_rate() -> f64 {
    0.2
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: default_login_delay_ms(),
            failure_rate: default_failure_rate(),
            normalize_profile_on_load: true,
            profile: ProfileConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

/// Demo profile attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_name")]
    pub name: String,

    #[serde(default = "default_profile_email")]
    pub email: String,

    #[serde(default = "default_profile_picture")]
    pub picture: Option<String>,
}

fn default_profile_name() -> String {
    "Demo User".to_string()
}

fn default_profile_email() -> String {
    "demo@example.com".to_string()
}

fn default_profile_picture() -> Option<String> {
    Some("https://images.example.com/avatars/demo.png".to_string())
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            email: default_profile_email(),
            picture: default_profile_picture(),
        }
    }
}

impl Config {
    /// Load configuration from a `config.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.session.validate()?;
        Ok(())
    }
}

impl SessionConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "session.failure_rate must be within 0.0..=1.0 (got {})",
                self.failure_rate
            )));
        }
        if self.profile.name.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "session.profile.name cannot be empty".to_string(),
            ));
        }
        let email = self.profile.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(crate::error::Error::InvalidConfig(format!(
                "session.profile.email '{}' is not an email address",
                self.profile.email
            )));
        }
        Ok(())
    }
}

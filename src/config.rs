//! Configuration management
//!
//! Named mail and push profiles plus geocoding settings, persisted as
//! YAML. Secrets (SMTP passwords, push application tokens, the geocoding
//! API key) are kept in the system keyring via `CredentialStore`, never in
//! the config file.
//!
//! Configuration files are stored in platform-specific directories:
//! - macOS: `~/Library/Application Support/fliix-helpers/config.yaml`
//! - Linux: `~/.config/fliix-helpers/config.yaml`
//! - Windows: `%APPDATA%\fliix-helpers\config.yaml`

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net";
pub const DEFAULT_GEOCODING_URL: &str = "https://maps.googleapis.com";

/// SMTP settings for one sender identity
///
/// The password lives in the keyring under [`mail_secret_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailProfile {
    /// SMTP server host name
    pub host: String,
    /// SMTP port, STARTTLS is always used
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP login
    pub user: String,
    /// Envelope and header `From` address
    pub from: String,
    /// Display name for `From` and `Reply-To`
    pub sender: String,
    /// `Reply-To` address
    pub reply_to: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Pushover recipient for one profile
///
/// The application token lives in the keyring under [`push_secret_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushProfile {
    /// Pushover user or group key
    pub user: String,
}

fn default_pushover_url() -> String {
    DEFAULT_PUSHOVER_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
        }
    }
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Mail profiles by name
    #[serde(default)]
    pub mail: HashMap<String, MailProfile>,
    /// Push profiles by name
    #[serde(default)]
    pub push: HashMap<String, PushProfile>,
    /// Pushover API root, overridable for staging proxies
    #[serde(default = "default_pushover_url")]
    pub pushover_url: String,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    /// Push profile that receives an alert whenever mail delivery fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_push_profile: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mail: HashMap::new(),
            push: HashMap::new(),
            pushover_url: default_pushover_url(),
            geocoding: GeocodingSettings::default(),
            alert_push_profile: None,
        }
    }
}

/// Keyring key of a mail profile's SMTP password
pub fn mail_secret_key(profile: &str) -> String {
    format!("mail:{}", profile)
}

/// Keyring key of a push profile's application token
pub fn push_secret_key(profile: &str) -> String {
    format!("push:{}", profile)
}

/// Keyring key of the geocoding API key
pub const GEOCODING_SECRET_KEY: &str = "geocoding";

impl Config {
    /// Loads configuration from the default config file location
    ///
    /// # Returns
    /// The loaded configuration, or an empty one if the file doesn't exist
    ///
    /// # Errors
    /// Returns an error if the file exists but is malformed or unreadable.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Saves the configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves the configuration to an explicit path
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))
    }

    /// Returns the platform-specific configuration file path
    ///
    /// Falls back to `~/.config/fliix-helpers/config.yaml` if platform
    /// detection fails.
    ///
    /// # Errors
    /// Returns an error if the HOME environment variable is not set (fallback case only).
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Path of the key/value settings file next to the config file
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.yaml"))
    }

    /// Settings file for an explicit config file, or the platform default
    pub fn settings_path_for(config_file: Option<&Path>) -> Result<PathBuf> {
        match config_file {
            Some(path) => Ok(path.with_file_name("settings.yaml")),
            None => Self::settings_path(),
        }
    }

    fn config_dir() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "fliix-helpers") {
            Ok(proj_dirs.config_dir().to_path_buf())
        } else {
            let home = std::env::var("HOME").context("HOME not set")?;
            Ok(PathBuf::from(home).join(".config/fliix-helpers"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
mail:
  office:
    host: smtp.example.at
    user: office@example.at
    from: office@example.at
    sender: Fliix Office
    reply_to: support@example.at
push:
  ops:
    user: u123
alert_push_profile: ops
"#;

    #[test]
    fn test_parse_sample_config_with_defaults() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();

        let office = &config.mail["office"];
        assert_eq!(office.port, 587);
        assert_eq!(office.sender, "Fliix Office");

        assert_eq!(config.push["ops"].user, "u123");
        assert_eq!(config.pushover_url, DEFAULT_PUSHOVER_URL);
        assert_eq!(config.geocoding.base_url, DEFAULT_GEOCODING_URL);
        assert_eq!(config.alert_push_profile.as_deref(), Some("ops"));
    }

    #[test]
    fn test_settings_live_next_to_explicit_config() {
        let settings = Config::settings_path_for(Some(Path::new("/tmp/a/config.yaml"))).unwrap();
        assert_eq!(settings, Path::new("/tmp/a/settings.yaml"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("fliix_helpers_config_{}", std::process::id()))
            .join("config.yaml");
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_gives_empty_config() {
        let config = Config::load_from(Path::new("/nonexistent/fliix/config.yaml")).unwrap();
        assert!(config.mail.is_empty());
        assert!(config.push.is_empty());
    }

    #[test]
    fn test_secret_keys() {
        assert_eq!(mail_secret_key("office"), "mail:office");
        assert_eq!(push_secret_key("ops"), "push:ops");
    }
}

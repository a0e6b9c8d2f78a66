//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use qkn_sdk::{ClientOptions, DEFAULT_SERVICE_URL, DEFAULT_SOCKET_PATH};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available profiles
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// File the configuration was loaded from
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// Connection profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Service base URL
    pub service_url: String,

    /// Socket.IO mount path, relative to the service URL
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Line-editor history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Push channel connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Card and table format
    Table,
    /// JSON format
    Json,
    /// Quiet (ids only) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(qkn_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::path()?)
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Self::default()
        };
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save configuration to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        match &self.source {
            Some(path) => self.save_to(path),
            None => self.save_to(Self::path()?),
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Add or update a profile.
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }

    /// Delete a profile other than the active one.
    pub fn delete_profile(&mut self, name: &str) -> Result<Profile> {
        if name == self.active_profile {
            return Err(CliError::NotPermitted(format!(
                "Cannot delete the active profile '{}'",
                name
            )));
        }
        self.profiles
            .remove(name)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' does not exist", name)))
    }

    /// SDK options derived from the active profile and settings.
    pub fn client_options(&self) -> Result<ClientOptions> {
        let profile = self.get_active_profile()?;
        Ok(ClientOptions {
            socket_path: profile.socket_path.clone(),
            timeout: Duration::from_secs(self.settings.request_timeout_secs.max(1)),
            connect_timeout: Duration::from_secs(self.settings.connect_timeout_secs.max(1)),
            ..ClientOptions::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "default".to_string(),
            Profile {
                service_url: DEFAULT_SERVICE_URL.to_string(),
                socket_path: DEFAULT_SOCKET_PATH.to_string(),
            },
        );

        Self {
            active_profile: "default".to_string(),
            profiles,
            settings: Settings::default(),
            source: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
            request_timeout_secs: 30,
            connect_timeout_secs: 20,
        }
    }
}

/// `~/.qkn`, where the config and line-editor history live.
pub fn qkn_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".qkn"))
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_socket_path() -> String {
    DEFAULT_SOCKET_PATH.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.active_profile, "default");
        assert_eq!(
            config.get_active_profile().unwrap().service_url,
            "http://localhost:8000"
        );
        assert!(config.settings.color);
    }

    #[test]
    fn test_profile_management() {
        let mut config = Config::default();

        let profile = Profile {
            service_url: "https://qkn.example.com".to_string(),
            socket_path: "live".to_string(),
        };

        config.set_profile("staging".to_string(), profile);
        assert!(config.profiles.contains_key("staging"));

        config.switch_profile("staging".to_string()).unwrap();
        assert_eq!(config.active_profile, "staging");
        assert_eq!(config.client_options().unwrap().socket_path, "live");
    }

    #[test]
    fn test_switch_to_nonexistent_profile() {
        let mut config = Config::default();
        let result = config.switch_profile("nonexistent".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_cannot_delete_active_profile() {
        let mut config = Config::default();
        assert!(matches!(
            config.delete_profile("default"),
            Err(CliError::NotPermitted(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::load_from(&path).unwrap();
        config.settings.format = OutputFormat::Json;
        config.set_profile(
            "lab".to_string(),
            Profile {
                service_url: "http://lab:9000".to_string(),
                socket_path: DEFAULT_SOCKET_PATH.to_string(),
            },
        );
        config.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.settings.format, OutputFormat::Json);
        assert_eq!(reloaded.profiles["lab"].service_url, "http://lab:9000");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "active_profile = \"prod\"\n\n[profiles.prod]\nservice_url = \"https://qkn.example.com\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let profile = config.get_active_profile().unwrap();
        assert_eq!(profile.socket_path, "socket.io");
        assert_eq!(config.settings.request_timeout_secs, 30);
        assert_eq!(config.settings.connect_timeout_secs, 20);
        assert_eq!(
            config.client_options().unwrap().connect_timeout,
            Duration::from_secs(20)
        );
    }
}

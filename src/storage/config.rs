use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Server list used when no --path is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers_file: Option<PathBuf>,

    /// List well-formed entries even when some lines are malformed
    #[serde(default)]
    pub skip_malformed: bool,
}

/// External OpenSSH client programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_ssh_program")]
    pub ssh_program: String,

    #[serde(default = "default_scp_program")]
    pub scp_program: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            ssh_program: default_ssh_program(),
            scp_program: default_scp_program(),
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a rotating log file instead of logging to stderr only
    #[serde(default)]
    pub file: bool,

    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: false,
            level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_ssh_program() -> String {
    "ssh".to_string()
}

fn default_scp_program() -> String {
    "scp".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Trait for configuration storage
pub trait ConfigStorage {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Save configuration to file
    fn save(&self, config: &Config) -> Result<()>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        // If file doesn't exist, create default and return it
        if !self.path.exists() {
            log::info!(
                "Config file not found at {:?}, creating default configuration",
                self.path
            );
            self.create_default()?;
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::debug!("Loaded configuration from {:?}", self.path);
        Ok(config)
    }

    fn save(&self, config: &Config) -> Result<()> {
        let toml_str = toml::to_string_pretty(config)
            .with_context(|| "Failed to serialize configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        fs::write(&self.path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", self.path))?;

        log::debug!("Saved configuration to {:?}", self.path);
        Ok(())
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../server-cli.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);
        Ok(())
    }
}

/// Load the configuration, starting logging before anything is written
///
/// `start_logging` runs with the loaded configuration, or with the defaults
/// when the file is missing. The default file is created afterwards so its
/// creation shows up in the log.
pub fn load_config(storage: &impl ConfigStorage, start_logging: impl FnOnce(&Config)) -> Result<Config> {
    if storage.path().exists() {
        let config = storage.load()?;
        start_logging(&config);
        return Ok(config);
    }

    let config = Config::default();
    start_logging(&config);
    storage.create_default()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.general.servers_file, None);
        assert!(!config.general.skip_malformed);
        assert_eq!(config.transport.ssh_program, "ssh");
        assert_eq!(config.transport.scp_program, "scp");
        assert!(!config.logging.file);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
        [general]
        servers_file = "/srv/servers"

        [transport]
        ssh_program = "/usr/local/bin/ssh"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.servers_file, Some(PathBuf::from("/srv/servers")));
        assert_eq!(config.transport.ssh_program, "/usr/local/bin/ssh");
        assert_eq!(config.transport.scp_program, "scp");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_example_config_parses_to_defaults() {
        let example = include_str!("../../server-cli.toml.example");
        let config: Config = toml::from_str(example).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_starts_logging_before_creating_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server-cli/config.toml");
        let storage = TomlConfigStorage::new(path.clone());

        let mut existed_at_start = None;
        let config = load_config(&storage, |config| {
            assert_eq!(*config, Config::default());
            existed_at_start = Some(path.exists());
        })
        .unwrap();

        assert_eq!(existed_at_start, Some(false));
        assert_eq!(config, Config::default());
        assert!(path.exists());

        fs::write(&path, "[logging]\nfile = true\n").unwrap();
        let mut seen = None;
        let config = load_config(&storage, |config| seen = Some(config.logging.file)).unwrap();
        assert_eq!(seen, Some(true));
        assert!(config.logging.file);
    }

    #[test]
    fn test_load_creates_default_then_round_trips() {
        let dir = tempdir().unwrap();
        let storage = TomlConfigStorage::new(dir.path().join("server-cli/config.toml"));

        let config = storage.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(storage.path().exists());

        let mut changed = config.clone();
        changed.general.skip_malformed = true;
        storage.save(&changed).unwrap();
        assert_eq!(storage.load().unwrap(), changed);
    }
}

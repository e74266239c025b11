pub mod config;
pub mod servers;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub use config::{
    Config, ConfigStorage, GeneralConfig, LoggingConfig, TomlConfigStorage, TransportConfig, load_config,
};
pub use servers::{RegistryStorage, TextRegistryStorage};

/// Per-user locations used by the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Default server list: ~/.local/var/servers
    pub servers_file: PathBuf,
    /// $XDG_CONFIG_HOME/server-cli/config.toml
    pub config_file: PathBuf,
    /// $XDG_STATE_HOME/server-cli/server.log
    pub log_file: PathBuf,
}

/// Resolve the per-user paths from the environment
///
/// XDG Base Directory Specification:
/// - Config: $XDG_CONFIG_HOME/server-cli (default: ~/.config/server-cli)
/// - State: $XDG_STATE_HOME/server-cli (default: ~/.local/state/server-cli)
pub fn default_paths() -> Result<Paths> {
    let home = env::var("HOME").context("HOME environment variable not set")?;

    Ok(paths_from(
        PathBuf::from(home),
        env::var("XDG_CONFIG_HOME").ok().map(PathBuf::from),
        env::var("XDG_STATE_HOME").ok().map(PathBuf::from),
    ))
}

fn paths_from(home: PathBuf, xdg_config: Option<PathBuf>, xdg_state: Option<PathBuf>) -> Paths {
    let config_dir = xdg_config
        .map(|dir| dir.join("server-cli"))
        .unwrap_or_else(|| home.join(".config/server-cli"));

    let state_dir = xdg_state
        .map(|dir| dir.join("server-cli"))
        .unwrap_or_else(|| home.join(".local/state/server-cli"));

    Paths {
        servers_file: home.join(".local/var/servers"),
        config_file: config_dir.join("config.toml"),
        log_file: state_dir.join("server.log"),
    }
}

/// Pick the server list: explicit --path, then config, then the default
pub fn servers_path(explicit: Option<PathBuf>, config: &Config, paths: &Paths) -> PathBuf {
    explicit
        .or_else(|| config.general.servers_file.clone())
        .unwrap_or_else(|| paths.servers_file.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_defaults() {
        let paths = paths_from(PathBuf::from("/home/me"), None, None);
        assert_eq!(paths.servers_file, PathBuf::from("/home/me/.local/var/servers"));
        assert_eq!(
            paths.config_file,
            PathBuf::from("/home/me/.config/server-cli/config.toml")
        );
        assert_eq!(
            paths.log_file,
            PathBuf::from("/home/me/.local/state/server-cli/server.log")
        );
    }

    #[test]
    fn test_paths_xdg_overrides() {
        let paths = paths_from(
            PathBuf::from("/home/me"),
            Some(PathBuf::from("/cfg")),
            Some(PathBuf::from("/state")),
        );
        assert_eq!(paths.config_file, PathBuf::from("/cfg/server-cli/config.toml"));
        assert_eq!(paths.log_file, PathBuf::from("/state/server-cli/server.log"));
        assert_eq!(paths.servers_file, PathBuf::from("/home/me/.local/var/servers"));
    }

    #[test]
    fn test_servers_path_precedence() {
        let paths = paths_from(PathBuf::from("/home/me"), None, None);
        let mut config = Config::default();

        assert_eq!(servers_path(None, &config, &paths), paths.servers_file);

        config.general.servers_file = Some(PathBuf::from("/srv/servers"));
        assert_eq!(servers_path(None, &config, &paths), PathBuf::from("/srv/servers"));

        assert_eq!(
            servers_path(Some(PathBuf::from("./mine")), &config, &paths),
            PathBuf::from("./mine")
        );
    }
}

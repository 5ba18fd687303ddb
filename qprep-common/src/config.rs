//! Configuration loading and database path resolution
//!
//! Two-tier configuration:
//! 1. **TOML bootstrap**: database path, listen port, accounts service URL,
//!    logging. Static for the lifetime of the process.
//! 2. **Database runtime**: engine tunables read from the `settings` table
//!    by each service after the pool is open.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from a TOML file
///
/// These settings cannot change during runtime. A service must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Path to the SQLite question corpus database
    ///
    /// If not specified, resolution falls through to the OS default
    /// (see [`resolve_database_path`]).
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the accounts service that owns user quota state
    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_port() -> u16 {
    5731
}

fn default_accounts_base_url() -> String {
    "http://127.0.0.1:5732".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: default_port(),
            accounts_base_url: default_accounts_base_url(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Load bootstrap configuration.
    ///
    /// An explicitly given path must exist and parse; a missing default
    /// location is not an error (built-in defaults apply).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            return toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse {:?}: {}", path, e)));
        }

        for candidate in default_config_paths() {
            if candidate.exists() {
                let content = std::fs::read_to_string(&candidate).map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", candidate, e))
                })?;
                return toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Failed to parse {:?}: {}", candidate, e)));
            }
        }

        Ok(Self::default())
    }
}

/// Default configuration file locations, in search order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("qprep").join("qprep.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/qprep/qprep.toml"));
    }
    paths
}

/// Database path resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &BootstrapConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database_path {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_database_path()
}

/// Get OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/qprep (or /var/lib/qprep for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("qprep"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/qprep"))
            .join("questions.db")
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/qprep
        dirs::data_dir()
            .map(|d| d.join("qprep"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/qprep"))
            .join("questions.db")
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\qprep
        dirs::data_local_dir()
            .map(|d| d.join("qprep"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\qprep"))
            .join("questions.db")
    } else {
        PathBuf::from("./qprep_data").join("questions.db")
    }
}

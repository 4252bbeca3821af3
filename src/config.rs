//! Configuration module for Stacksmith
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/stacksmith/stacksmith.toml)
//! - User configuration (~/.stacksmith.toml, ~/.stacksmith/config.toml)
//! - Project configuration (./stacksmith.toml)
//! - Environment variables
//!
//! Later files override earlier ones key by key, so a project file only needs
//! to mention the settings it changes.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::{Error, Result};
use crate::stack::{
    BrokerSettings, InstanceSettings, NetworkSettings, SecuritySettings, StackSettings,
};

/// Environment variable naming a config file to use instead of the search path.
pub const CONFIG_ENV_VAR: &str = "STACKSMITH_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Network settings
    pub network: NetworkSettings,

    /// Security group settings
    pub security: SecuritySettings,

    /// Instance settings
    pub instance: InstanceSettings,

    /// Broker bootstrap settings
    pub broker: BrokerSettings,

    /// Assembly output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Assembly output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Assembly directory
    pub directory: PathBuf,

    /// Indent JSON artifacts
    pub pretty: bool,

    /// Colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("cdk.out"),
            pretty: true,
            color: true,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human format
    #[default]
    Pretty,
    /// Single-line human format
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(Error::invalid_config(
                "logging.format",
                format!("unknown log format '{s}'. Valid: pretty, compact, json"),
            )),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when neither `-v` nor `RUST_LOG` is given
    pub level: String,

    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;

        // Load from standard locations
        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                tracing::debug!("Loading config file {}", path.display());
                merge_values(&mut merged, Self::read_file(&path)?);
            } else if config_path.is_some() {
                return Err(Error::Config(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
        }

        let mut config: Config =
            serde_json::from_value(merged).map_err(|e| Error::Config(e.to_string()))?;

        // Apply environment variable overrides
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load from a single file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;
        merge_values(&mut merged, Self::read_file(path.as_ref())?);
        let config: Config = serde_json::from_value(merged).map_err(|e| Error::ConfigParse {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values serde accepts but the rest of the program cannot use
    pub fn validate(&self) -> Result<()> {
        LevelFilter::from_str(&self.logging.level).map_err(|_| {
            Error::invalid_config(
                "logging.level",
                format!(
                    "unknown log level '{}'. Valid: off, error, warn, info, debug, trace",
                    self.logging.level
                ),
            )
        })?;
        Ok(())
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        if let Ok(env_config) = std::env::var(CONFIG_ENV_VAR) {
            return vec![PathBuf::from(env_config)];
        }

        let mut paths = vec![PathBuf::from("/etc/stacksmith/stacksmith.toml")];

        // User config
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stacksmith.toml"));
            paths.push(home.join(".stacksmith/config.toml"));
        }

        // Project config (current directory)
        paths.push(PathBuf::from("stacksmith.toml"));

        paths
    }

    /// Parse one file into a loosely typed tree, by extension
    fn read_file(path: &Path) -> Result<serde_json::Value> {
        let content = std::fs::read_to_string(path)?;
        let parse_error = |message: String| Error::ConfigParse {
            path: path.to_path_buf(),
            message,
        };

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let value: serde_json::Value = match extension {
            "yml" | "yaml" => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            "json" => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            "toml" => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => {
                // Try TOML first, then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .map_err(|e| parse_error(e.to_string()))?
            }
        };

        // An empty YAML document parses to null
        if value.is_null() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        if !value.is_object() {
            return Err(parse_error("top level must be a table".to_string()));
        }
        Ok(value)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // STACKSMITH_OUTDIR
        if let Some(dir) = lookup("STACKSMITH_OUTDIR") {
            self.output.directory = PathBuf::from(dir);
        }

        // STACKSMITH_SSH_CIDR
        if let Some(cidr) = lookup("STACKSMITH_SSH_CIDR") {
            cidr.parse::<crate::resource::Ipv4Cidr>()
                .map_err(|e| Error::invalid_config("STACKSMITH_SSH_CIDR", e.to_string()))?;
            self.security.ssh_ingress_cidr = cidr;
        }

        // STACKSMITH_LOG_FORMAT
        if let Some(format) = lookup("STACKSMITH_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        // NO_COLOR
        if lookup("NO_COLOR").is_some() {
            self.output.color = false;
        }

        Ok(())
    }

    /// The settings the stack definition reads
    pub fn settings(&self) -> StackSettings {
        StackSettings {
            network: self.network.clone(),
            security: self.security.clone(),
            instance: self.instance.clone(),
            broker: self.broker.clone(),
        }
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, everything else replaces.
fn merge_values(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

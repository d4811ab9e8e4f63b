//! Configuration file handling.
//!
//! This module provides loading and saving of depscan configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/depscan/config.toml`
//! - macOS: `~/Library/Application Support/depscan/config.toml`
//! - Windows: `%APPDATA%\depscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_format = "table"
//!
//! [osv]
//! base_url = "https://api.osv.dev"
//! connect_timeout_secs = 10
//! timeout_secs = 30
//! max_connections = 20
//! max_keepalive_connections = 10
//! batch_size = 1000
//!
//! [[ecosystems]]
//! name = "Go"
//! detect = ["go.mod"]
//!
//! [[ecosystems.files]]
//! path = "go.mod"
//! format = "gomod"
//! role = "manifest"
//! priority = 2
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::model::{Format, Role};

/// Application configuration.
///
/// Loaded once at startup and passed to the components that need it.
///
/// # Example
///
/// ```no_run
/// use depscan::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("OSV endpoint: {}", config.osv.base_url);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    /// Default: "table"
    pub default_format: String,

    /// Vulnerability database client settings.
    pub osv: OsvConfig,

    /// Ecosystems tried, in order, when detecting what a project uses.
    pub ecosystems: Vec<EcosystemConfig>,
}

/// Settings for talking to the OSV API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OsvConfig {
    /// Base URL of the API, without the `/v1` path.
    ///
    /// Default: `https://api.osv.dev`
    pub base_url: String,

    /// Time allowed to establish a connection, in seconds.
    ///
    /// Default: 10
    pub connect_timeout_secs: u64,

    /// Time allowed for a whole request, in seconds.
    ///
    /// Default: 30
    pub timeout_secs: u64,

    /// Maximum vulnerability detail requests in flight.
    ///
    /// Default: 20
    pub max_connections: usize,

    /// Maximum idle connections kept for reuse.
    ///
    /// Default: 10
    pub max_keepalive_connections: usize,

    /// Maximum queries per batch request.
    ///
    /// Default: 1000 (the API's limit)
    pub batch_size: usize,
}

impl Default for OsvConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.osv.dev".to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_connections: 20,
            max_keepalive_connections: 10,
            batch_size: 1000,
        }
    }
}

/// How to recognise an ecosystem and where its dependencies live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcosystemConfig {
    /// Name reported in results.
    pub name: String,

    /// Files whose presence in the project root selects this ecosystem.
    pub detect: Vec<String>,

    /// Candidate dependency files, highest `priority` first.
    pub files: Vec<DependencySource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencySource {
    /// Path relative to the project root.
    pub path: String,
    pub format: Format,
    pub role: Role,
    #[serde(default)]
    pub priority: u32,
}

impl DependencySource {
    fn new(path: &str, format: Format, role: Role, priority: u32) -> Self {
        Self {
            path: path.to_string(),
            format,
            role,
            priority,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: "table".to_string(),
            osv: OsvConfig::default(),
            ecosystems: default_ecosystems(),
        }
    }
}

fn default_ecosystems() -> Vec<EcosystemConfig> {
    vec![
        EcosystemConfig {
            name: "Go".to_string(),
            detect: vec!["go.mod".to_string()],
            files: vec![
                DependencySource::new("go.mod", Format::Gomod, Role::Manifest, 2),
                DependencySource::new("go.sum", Format::Text, Role::Checksum, 1),
            ],
        },
        EcosystemConfig {
            name: "npm".to_string(),
            detect: vec![
                "package.json".to_string(),
                "package-lock.json".to_string(),
                "yarn.lock".to_string(),
                "pnpm-lock.yaml".to_string(),
            ],
            files: vec![
                DependencySource::new("package-lock.json", Format::Json, Role::Lockfile, 4),
                DependencySource::new("pnpm-lock.yaml", Format::Yaml, Role::Lockfile, 3),
                DependencySource::new("yarn.lock", Format::Yarn, Role::Lockfile, 2),
                DependencySource::new("package.json", Format::Json, Role::Manifest, 1),
            ],
        },
    ]
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::from_toml(&fs::read_to_string(&path)?)
    }

    /// Parses configuration text; missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

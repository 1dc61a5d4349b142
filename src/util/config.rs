//! Configuration file support for govendor.
//!
//! govendor reads two optional configuration files:
//! - Global: `<config dir>/govendor/config.toml` - User-wide defaults
//! - Project: `.govendor/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! and `GOVENDOR_GO` take precedence over both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// govendor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Go toolchain settings
    pub go: GoConfig,

    /// Vendoring defaults
    pub vendor: VendorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GoConfig {
    /// Path to the `go` binary (default: first `go` on PATH)
    pub binary: Option<PathBuf>,

    /// Timeout for a single `go` invocation, in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VendorConfig {
    /// Extra `os/arch` platforms to resolve
    pub include_platforms: Vec<String>,

    /// Number of modules hashed concurrently
    pub jobs: Option<usize>,

    /// Treat generator version mismatches as drift in check mode
    pub strict: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.go.binary.is_some() {
            self.go.binary = other.go.binary;
        }
        if other.go.timeout_secs.is_some() {
            self.go.timeout_secs = other.go.timeout_secs;
        }

        if !other.vendor.include_platforms.is_empty() {
            self.vendor.include_platforms = other.vendor.include_platforms;
        }
        if other.vendor.jobs.is_some() {
            self.vendor.jobs = other.vendor.jobs;
        }
        if other.vendor.strict {
            self.vendor.strict = true;
        }
    }

    pub fn go_timeout(&self) -> Option<Duration> {
        self.go.timeout_secs.map(Duration::from_secs)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.govendor/config.toml)
/// 2. Global config
/// 3. Defaults
///
/// A file that exists but cannot be parsed is an error.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global) = global_path.filter(|p| p.exists()) {
        config.merge(Config::load(global)?);
    }

    if project_path.exists() {
        config.merge(Config::load(project_path)?);
    }

    Ok(config)
}

/// The user-wide config file, if the platform has a config directory.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "govendor").map(|d| d.config_dir().join("config.toml"))
}

/// The project config file under `project_root`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".govendor").join("config.toml")
}

//! Harness configuration.
//!
//! Everything is optional; a missing key keeps its default. Command line
//! flags override whatever the file sets.
//!
//! ```toml
//! timeout_secs = 300
//! cwd = "../impl"
//! exports_command = ["moon", "run", "cmd/compat_export"]
//! large_command = ["moon", "run", "cmd/compat_export_large"]
//! document_fixtures = "loro_fixtures.mbt"
//! awareness_fixtures = "awareness_fixtures.mbt"
//! ```

use crate::fixtures::{AWARENESS_FIXTURES_FILE, DOCUMENT_FIXTURES_FILE};
use crate::verify::Check;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("timeout must be at least one second")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub timeout_secs: u64,
    /// Working directory for the implementation under test.
    pub cwd: Option<PathBuf>,
    pub exports_command: Vec<String>,
    pub large_command: Vec<String>,
    pub document_fixtures: PathBuf,
    pub awareness_fixtures: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cwd: None,
            exports_command: vec!["compat-export".to_string()],
            large_command: vec!["compat-export".to_string(), "--large".to_string()],
            document_fixtures: PathBuf::from(DOCUMENT_FIXTURES_FILE),
            awareness_fixtures: PathBuf::from(AWARENESS_FIXTURES_FILE),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn command_for(&self, check: Check) -> &[String] {
        match check {
            Check::Exports => &self.exports_command,
            Check::Large => &self.large_command,
        }
    }
}

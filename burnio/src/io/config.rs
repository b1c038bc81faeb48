//! Controller configuration loaded from an optional TOML file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Controller configuration (TOML).
///
/// Every field is optional in the file. Missing fields default to the values
/// the controller uses without a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BurnioConfig {
    /// Directory holding the log artifact and the scratch data file.
    pub artifact_dir: PathBuf,

    /// How long the launcher waits before checking for startup errors.
    pub grace_interval_ms: u64,

    /// Per-command timeout for the command channel. Unset means no timeout.
    pub command_timeout_secs: Option<u64>,

    /// Truncate captured command stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for BurnioConfig {
    fn default() -> Self {
        Self {
            artifact_dir: std::env::temp_dir(),
            grace_interval_ms: 1000,
            command_timeout_secs: None,
            output_limit_bytes: 100_000,
        }
    }
}

impl BurnioConfig {
    pub fn validate(&self) -> Result<()> {
        if self.artifact_dir.as_os_str().is_empty() {
            return Err(anyhow!("artifact_dir must not be empty"));
        }
        if self.grace_interval_ms == 0 {
            return Err(anyhow!("grace_interval_ms must be > 0"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn grace_interval(&self) -> Duration {
        Duration::from_millis(self.grace_interval_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BurnioConfig::default()`.
pub fn load_config(path: &Path) -> Result<BurnioConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = BurnioConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BurnioConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

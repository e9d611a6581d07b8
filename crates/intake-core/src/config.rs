use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Project configuration read from `.intake/config.toml`.
///
/// Business constants (slice counts, payouts, tier thresholds, the transition
/// table) are deliberately absent; only operational knobs live here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Business days a client gets to finish execution.
    #[serde(default = "default_deadline_days")]
    pub deadline_days: u32,
    /// External platforms each client must register on, in checklist order.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            deadline_days: default_deadline_days(),
            platforms: default_platforms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database path, relative to the project root unless absolute.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl IntakeConfig {
    /// Resolve the configured store path against `project_root`.
    #[must_use]
    pub fn store_path(&self, project_root: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            project_root.join(&self.store.path)
        }
    }

    /// Check the values serde cannot: a non-zero execution window and a
    /// non-empty, duplicate-free platform list.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.execution.deadline_days == 0 {
            anyhow::bail!("execution.deadline_days must be at least 1");
        }

        let platforms = &self.execution.platforms;
        if platforms.is_empty() {
            anyhow::bail!("execution.platforms must name at least one platform");
        }
        let mut seen = HashSet::new();
        for platform in platforms {
            let name = platform.trim();
            if name.is_empty() {
                anyhow::bail!("execution.platforms contains an empty platform name");
            }
            if !seen.insert(name) {
                anyhow::bail!("execution.platforms lists '{name}' more than once");
            }
        }
        Ok(())
    }
}

/// Load `.intake/config.toml` under `project_root`, falling back to defaults
/// when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed, or if
/// [`IntakeConfig::validate`] rejects it.
pub fn load_config(project_root: &Path) -> Result<IntakeConfig> {
    let path = project_root.join(".intake/config.toml");
    if !path.exists() {
        return Ok(IntakeConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<IntakeConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;

    Ok(config)
}

const fn default_true() -> bool {
    true
}

const fn default_deadline_days() -> u32 {
    3
}

fn default_platforms() -> Vec<String> {
    ["draftkings", "fanduel", "betmgm", "caesars"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".intake/intake.sqlite3")
}

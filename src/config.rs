//! Per-workspace settings read from `orientd.json`.

use crate::autosave::{is_interval_choice, DEFAULT_INTERVAL_MINUTES, INTERVAL_CHOICES_MINUTES};
use crate::snapshot::DEFAULT_BACKUP_PREFIX;
use crate::store::PersistPolicy;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "orientd.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub backup_prefix: String,
    pub autosave_interval_minutes: u64,
    /// Apply the auto-save slot on open.
    pub recover_autosave: bool,
    pub persist_policy: PersistPolicy,
    /// Fill never-written collections with the sample records.
    pub seed_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            autosave_interval_minutes: DEFAULT_INTERVAL_MINUTES,
            recover_autosave: true,
            persist_policy: PersistPolicy::LogAndContinue,
            seed_defaults: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_interval_choice(self.autosave_interval_minutes) {
            return Err(anyhow!(
                "autosaveIntervalMinutes must be one of {:?}",
                INTERVAL_CHOICES_MINUTES
            ));
        }
        if self.backup_prefix.trim().is_empty() {
            return Err(anyhow!("backupPrefix must not be empty"));
        }
        Ok(())
    }
}

/// Read the workspace config; a missing file means defaults.
pub fn load_workspace_config(workspace: &Path) -> anyhow::Result<Config> {
    let path = workspace.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let cfg: Config = serde_json::from_str(&text)
        .with_context(|| format!("{} is invalid JSON", path.to_string_lossy()))?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn save_workspace_config(workspace: &Path, cfg: &Config) -> anyhow::Result<()> {
    let path = workspace.join(CONFIG_FILE);
    let text = serde_json::to_string_pretty(cfg).context("failed to serialize config")?;
    std::fs::write(&path, text)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

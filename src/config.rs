use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProfsError;
use crate::paths::{CONFIG_FILE_NAME, Paths};

/// Raw configuration stored in <config dir>/global.json
///
/// Entries are kept exactly as written: absolute paths, or `~/...` for
/// anything under the home directory.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RawConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub paths: Vec<String>,
}

// Older writers emitted `"paths": null` for an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawConfig {
    /// Read the config, creating an empty one on disk if the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let blank = Self::default();
            blank.save(path)?;
            return Ok(blank);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read global config file: {:?}", path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse global config from file: {:?}", path))
    }

    /// Write the config atomically
    ///
    /// Writes to a temp file next to the target and renames it into place,
    /// so a crash never leaves a half-written config behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize global config")?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp config file: {:?}", temp_path))?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename config file: {:?} -> {:?}", temp_path, path))
    }

    /// Entries with `~` expanded
    pub fn expanded(&self, paths: &Paths) -> Vec<PathBuf> {
        self.paths.iter().map(|p| paths.expand_home(p)).collect()
    }
}

/// Delete the active config directory and re-create an empty config in the
/// preferred location. Managed paths and companion dirs are left alone.
///
/// Returns the path of the fresh config file.
pub fn reset(paths: &Paths) -> Result<PathBuf> {
    let dir = paths.active_config_dir();
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to reset configuration: {:?}", dir))?;
    }

    let fresh = paths.config_dir.join(CONFIG_FILE_NAME);
    RawConfig::default().save(&fresh)?;
    Ok(fresh)
}

/// Move the legacy ~/.profs config dir to the preferred location
pub fn migrate_config_dir(paths: &Paths) -> Result<()> {
    if !paths.legacy_config_dir.is_dir() {
        bail!(ProfsError::LegacyConfigMissing(paths.legacy_config_dir.clone()));
    }
    if paths.config_dir.exists() {
        bail!(ProfsError::ConfigDirExists(paths.config_dir.clone()));
    }

    if let Some(parent) = paths.config_dir.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    fs::rename(&paths.legacy_config_dir, &paths.config_dir).with_context(|| {
        format!(
            "Failed to migrate configuration: {:?} -> {:?}",
            paths.legacy_config_dir, paths.config_dir
        )
    })
}

//! Registering and unregistering managed paths.
//!
//! `add_path` turns an ordinary directory (or file) into a managed path: its
//! current content becomes a profile snapshot in the companion directory and
//! the original location becomes a symlink to it. `remove_path` only edits the
//! config; nothing on disk is touched.
//!
//! Neither operation is transactional. If saving the config fails after the
//! filesystem was changed, the two stay out of sync until fixed by hand.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RawConfig;
use crate::error::ProfsError;
use crate::fs_utils::{absolute_link_target, absolutize, clean_path, entry_exists, is_symlink, make_symlink};
use crate::model::ConfigModel;
use crate::paths::{Paths, companion_dir};
use crate::profiles::validate_profile_name;

/// Something worth telling the user that did not stop the operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The path was already a symlink into its companion dir
    AlreadyManaged(PathBuf),
    /// The path did not exist and was created empty before being snapshotted
    CreatedMissing(PathBuf),
    /// A snapshot with this profile name already existed, so nothing was moved
    SnapshotExists(PathBuf),
}

/// Result of [`add_path`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub src_path: PathBuf,
    pub profile: String,
    /// The entry as written to the config (`~`-abbreviated when under home)
    pub stored_as: String,
    pub notices: Vec<Notice>,
}

/// Pick the profile for a new path: the explicit one, or the single active one
pub fn infer_profile(model: &ConfigModel, requested: Option<&str>) -> Result<String> {
    if let Some(name) = requested {
        validate_profile_name(name)?;
        return Ok(name.to_string());
    }

    let mut active = model.active_profile_names();
    let err = match active.len() {
        0 => ProfsError::NoActiveProfile,
        1 => return Ok(active.remove(0)),
        _ => ProfsError::MultipleActiveProfiles(active),
    };
    Err(err).context("No profile specified and none can be inferred, pass one with --profile")
}

/// Start managing `path` under profile `profile` (or the active profile)
pub fn add_path(
    paths: &Paths,
    raw: &mut RawConfig,
    model: &ConfigModel,
    path: &Path,
    profile: Option<&str>,
) -> Result<AddOutcome> {
    let profile = infer_profile(model, profile)?;
    let src = absolutize(path)?;

    if raw
        .expanded(paths)
        .iter()
        .map(|existing| absolutize(existing))
        .collect::<Result<Vec<_>>>()?
        .contains(&src)
    {
        bail!(ProfsError::PathAlreadyConfigured(src));
    }

    let companion = companion_dir(&src);
    fs::create_dir_all(&companion).with_context(|| {
        format!(
            "Failed to create .profs directory at '{}'",
            companion.display()
        )
    })?;

    let mut notices = Vec::new();

    if is_symlink(&src)? {
        let target = absolute_link_target(&src)?;
        let target_parent = clean_path(target.parent().unwrap_or(&target));
        if target_parent != clean_path(&companion) {
            bail!(ProfsError::ForeignSymlink {
                path: src,
                target_parent,
                companion,
            });
        }
        notices.push(Notice::AlreadyManaged(src.clone()));
    } else {
        let snapshot = companion.join(&profile);
        if entry_exists(&snapshot)? {
            notices.push(Notice::SnapshotExists(snapshot.clone()));
        } else {
            if !entry_exists(&src)? {
                fs::create_dir_all(&src)
                    .with_context(|| format!("Failed to create path '{}'", src.display()))?;
                notices.push(Notice::CreatedMissing(src.clone()));
            }
            fs::rename(&src, &snapshot).with_context(|| {
                format!(
                    "Failed to move '{}' into '{}'",
                    src.display(),
                    snapshot.display()
                )
            })?;
        }

        make_symlink(&snapshot, &src)?;
    }

    let stored_as = paths.abbreviate_home(&src);
    raw.paths.push(stored_as.clone());
    raw.save(&paths.config_file)?;

    Ok(AddOutcome {
        src_path: src,
        profile,
        stored_as,
        notices,
    })
}

/// Stop managing a path. Matches the entry as written or by absolute path.
///
/// Returns the removed config entries.
pub fn remove_path(paths: &Paths, raw: &mut RawConfig, entry: &str) -> Result<Vec<String>> {
    let hits = entry_hits(paths, raw, entry)?;

    let (removed, kept): (Vec<_>, Vec<_>) = raw
        .paths
        .drain(..)
        .zip(hits)
        .partition(|(_, hit)| *hit);
    raw.paths = kept.into_iter().map(|(p, _)| p).collect();
    let removed: Vec<String> = removed.into_iter().map(|(p, _)| p).collect();

    raw.save(&paths.config_file)?;
    Ok(removed)
}

/// Config entries that `entry` refers to, without changing anything
pub fn configured_entries(paths: &Paths, raw: &RawConfig, entry: &str) -> Result<Vec<String>> {
    let hits = entry_hits(paths, raw, entry)?;
    Ok(raw
        .paths
        .iter()
        .zip(hits)
        .filter(|(_, hit)| *hit)
        .map(|(p, _)| p.clone())
        .collect())
}

// One flag per config entry; fails when none match
fn entry_hits(paths: &Paths, raw: &RawConfig, entry: &str) -> Result<Vec<bool>> {
    let wanted = absolutize(&paths.expand_home(entry))?;

    let mut hits = Vec::with_capacity(raw.paths.len());
    for existing in &raw.paths {
        hits.push(existing == entry || absolutize(&paths.expand_home(existing))? == wanted);
    }

    if !hits.contains(&true) {
        bail!(ProfsError::PathNotConfigured(entry.to_string()));
    }
    Ok(hits)
}

//! Profile snapshots inside companion directories.
//!
//! This module handles the profile side of the data model:
//! - Scanning a companion directory for profile entries
//! - Validating profile names
//! - Adding a profile to every managed path (empty or copied from the active one)
//! - Removing a profile from every managed path
//!
//! It works on the `<path>.profs/` directories next to each managed path.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ProfsError;
use crate::fs_utils::{copy_dir_recursive, entry_exists, remove_entry};
use crate::model::ConfigModel;

/// A profile entry found in a companion directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub path: PathBuf,
}

/// List the profile entries of a companion directory, sorted by name
///
/// Directories, regular files and symlinks count as profiles; other special
/// files are ignored. A missing directory yields an empty list.
pub fn scan_profiles(dir: &Path) -> Result<Vec<Profile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read dir: {}", dir.display()));
        }
    };

    let mut profiles = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read dir: {}", dir.display()))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to get file info: {}", entry.path().display()))?;

        if file_type.is_dir() || file_type.is_file() || file_type.is_symlink() {
            profiles.push(Profile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }
    }
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

/// Validate profile name
///
/// Names become path components, so only alphanumeric characters, dots,
/// underscores and hyphens are allowed, and a leading dot is rejected.
pub fn validate_profile_name(name: &str) -> Result<()> {
    let invalid = |reason| ProfsError::InvalidProfileName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        bail!(invalid("name cannot be empty"));
    }

    if name.chars().count() > 64 {
        bail!(invalid("name cannot be longer than 64 characters"));
    }

    if name.starts_with('.') {
        bail!(invalid("name cannot start with '.'"));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        bail!(invalid(
            "only alphanumeric characters, '.', '-' and '_' are allowed"
        ));
    }

    Ok(())
}

/// Where a new profile was created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProfile {
    pub src_path: PathBuf,
    pub profile_path: PathBuf,
    /// The active profile it was copied from, if any
    pub copied_from: Option<String>,
}

/// Create profile `name` in every companion directory
///
/// All managed paths must resolve cleanly before anything is written. The
/// per-path loop itself is not rolled back if a later path fails.
pub fn add_profile(model: &ConfigModel, name: &str, copy_existing: bool) -> Result<Vec<CreatedProfile>> {
    validate_profile_name(name)?;

    if model
        .detected_profile_names()
        .iter()
        .any(|existing| existing.eq_ignore_ascii_case(name))
    {
        bail!(ProfsError::ProfileExists(name.to_string()));
    }

    if model.is_empty() {
        bail!(ProfsError::NoManagedPaths);
    }

    if let Some(path) = model.paths.iter().find(|p| !p.status.is_ok()) {
        bail!(ProfsError::PathNotReady {
            name: name.to_string(),
            path: path.src_path.clone(),
            status: path.status,
        });
    }

    let source_profile = if copy_existing {
        let mut active = model.active_profile_names();
        match active.len() {
            0 => bail!(ProfsError::NoActiveProfile),
            1 => active.pop(),
            _ => bail!(ProfsError::MultipleActiveProfiles(active)),
        }
    } else {
        None
    };

    let mut created = Vec::with_capacity(model.paths.len());
    for path in &model.paths {
        let companion = path.companion_dir();
        let new_profile = companion.join(name);

        match &source_profile {
            Some(source_name) => {
                let source = companion.join(source_name);
                let meta = fs::metadata(&source).with_context(|| {
                    format!(
                        "Failed to stat current profile '{}' for path '{}'",
                        source_name,
                        path.src_path.display()
                    )
                })?;
                if meta.is_dir() {
                    copy_dir_recursive(&source, &new_profile)?;
                } else {
                    fs::copy(&source, &new_profile).with_context(|| {
                        format!(
                            "Failed to copy {} to {}",
                            source.display(),
                            new_profile.display()
                        )
                    })?;
                }
            }
            None => {
                fs::create_dir_all(&new_profile).with_context(|| {
                    format!(
                        "Failed to create profile directory '{}' for path '{}'",
                        new_profile.display(),
                        path.src_path.display()
                    )
                })?;
            }
        }

        created.push(CreatedProfile {
            src_path: path.src_path.clone(),
            profile_path: new_profile,
            copied_from: source_profile.clone(),
        });
    }

    Ok(created)
}

/// Outcome of removing a profile from one managed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed { src_path: PathBuf, profile_path: PathBuf },
    Missing { src_path: PathBuf },
}

/// Result of [`remove_profile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveProfileReport {
    /// The profile name as spelled on disk
    pub name: String,
    pub removals: Vec<Removal>,
}

/// The detected spelling of `name`, compared case-insensitively
pub fn find_profile_name(model: &ConfigModel, name: &str) -> Option<String> {
    let detected = model.detected_profile_names();
    detected
        .iter()
        .find(|n| n.as_str() == name)
        .or_else(|| detected.iter().find(|n| n.eq_ignore_ascii_case(name)))
        .cloned()
}

/// Delete profile `name` from every companion directory where it exists
///
/// Refuses to touch a profile that any managed path currently points at.
pub fn remove_profile(model: &ConfigModel, name: &str) -> Result<RemoveProfileReport> {
    let Some(name) = find_profile_name(model, name) else {
        bail!(ProfsError::ProfileNotFound {
            name: name.to_string(),
            available: model.detected_profile_names(),
        });
    };

    if model.active_profile_names().contains(&name) {
        bail!(ProfsError::ProfileActive(name));
    }

    let mut removals = Vec::with_capacity(model.paths.len());
    for path in &model.paths {
        let profile_path = path.companion_dir().join(&name);
        if !entry_exists(&profile_path)? {
            removals.push(Removal::Missing {
                src_path: path.src_path.clone(),
            });
            continue;
        }

        remove_entry(&profile_path).with_context(|| {
            format!(
                "Failed to remove profile '{}' in path '{}'",
                name,
                path.src_path.display()
            )
        })?;
        removals.push(Removal::Removed {
            src_path: path.src_path.clone(),
            profile_path,
        });
    }

    Ok(RemoveProfileReport { name, removals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{activate, make_profiles, model_of, setup_test_paths};
    use tempfile::TempDir;

    fn profs_error(err: &anyhow::Error) -> &ProfsError {
        err.downcast_ref::<ProfsError>().expect("expected a ProfsError")
    }

    #[test]
    fn test_profile_name_validation() {
        assert!(validate_profile_name("work").is_ok());
        assert!(validate_profile_name("my-profile").is_ok());
        assert!(validate_profile_name("test_123").is_ok());
        assert!(validate_profile_name("v1.2").is_ok());

        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name(".hidden").is_err());
        assert!(validate_profile_name("..").is_err());
        assert!(validate_profile_name("invalid name").is_err());
        assert!(validate_profile_name("test/profile").is_err());
        assert!(validate_profile_name("emoji😊").is_err());
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let profiles = scan_profiles(&temp_dir.path().join("nope.profs")).unwrap();
        assert!(profiles.is_empty());
    }

    #[test]
    fn test_scan_includes_files_dirs_and_links() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a.profs");
        fs::create_dir_all(dir.join("work")).unwrap();
        fs::write(dir.join("home"), "file profile").unwrap();
        std::os::unix::fs::symlink(dir.join("work"), dir.join("linked")).unwrap();

        let names: Vec<_> = scan_profiles(&dir)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["home", "linked", "work"]);
    }

    #[test]
    fn test_scan_file_instead_of_dir_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.profs");
        fs::write(&file, "oops").unwrap();
        assert!(scan_profiles(&file).is_err());
    }

    #[test]
    fn test_add_profile_empty() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home"]);
        let b = make_profiles(&temp_dir, "b", &["home"]);
        activate(&a, "home");
        activate(&b, "home");

        let model = model_of(&paths, &[&a, &b]);
        let created = add_profile(&model, "work", false).unwrap();
        assert_eq!(created.len(), 2);
        assert!(temp_dir.path().join("a.profs/work").is_dir());
        assert!(temp_dir.path().join("b.profs/work").is_dir());
        assert!(!temp_dir.path().join("a.profs/work/marker").exists());

        let model = model_of(&paths, &[&a, &b]);
        assert_eq!(model.detected_profile_names(), vec!["home", "work"]);
    }

    #[test]
    fn test_add_profile_copies_active() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home"]);
        activate(&a, "home");
        let b = temp_dir.path().join("b");
        fs::create_dir_all(temp_dir.path().join("b.profs")).unwrap();
        fs::write(temp_dir.path().join("b.profs/home"), "single file").unwrap();
        activate(&b, "home");

        let model = model_of(&paths, &[&a, &b]);
        let created = add_profile(&model, "copy", true).unwrap();
        assert_eq!(created[0].copied_from.as_deref(), Some("home"));

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.profs/copy/marker")).unwrap(),
            "home"
        );
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("b.profs/copy")).unwrap(),
            "single file"
        );
    }

    #[test]
    fn test_add_profile_copy_requires_single_active() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "work"]);
        let b = make_profiles(&temp_dir, "b", &["home", "work"]);
        activate(&a, "home");
        activate(&b, "work");

        let model = model_of(&paths, &[&a, &b]);
        let err = add_profile(&model, "x", true).unwrap_err();
        assert!(matches!(
            profs_error(&err),
            ProfsError::MultipleActiveProfiles(names) if names.len() == 2
        ));
        let msg = format!("{err:#}");
        assert_eq!(msg, "Multiple active profiles found (home, work)");
        assert!(!msg.contains("--profile"));
        assert!(!temp_dir.path().join("a.profs/x").exists());
    }

    #[test]
    fn test_add_profile_name_collision_ignores_case() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["Work"]);
        activate(&a, "Work");

        let model = model_of(&paths, &[&a]);
        let err = add_profile(&model, "work", false).unwrap_err();
        assert!(matches!(profs_error(&err), ProfsError::ProfileExists(_)));
    }

    #[test]
    fn test_add_profile_requires_all_ok() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home"]);
        activate(&a, "home");
        let b = make_profiles(&temp_dir, "b", &["home"]);

        let model = model_of(&paths, &[&a, &b]);
        let err = add_profile(&model, "work", false).unwrap_err();
        assert!(matches!(
            profs_error(&err),
            ProfsError::PathNotReady { status, .. } if *status == crate::model::Status::ErrorSrcNotFound
        ));
        // nothing was created, not even on the healthy path
        assert!(!temp_dir.path().join("a.profs/work").exists());
    }

    #[test]
    fn test_add_profile_without_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let model = model_of(&paths, &[]);
        let err = add_profile(&model, "work", false).unwrap_err();
        assert!(matches!(profs_error(&err), ProfsError::NoManagedPaths));
    }

    #[test]
    fn test_remove_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "old"]);
        let b = make_profiles(&temp_dir, "b", &["home"]);
        activate(&a, "home");
        activate(&b, "home");

        let model = model_of(&paths, &[&a, &b]);
        let report = remove_profile(&model, "OLD").unwrap();
        assert_eq!(report.name, "old");
        assert!(matches!(report.removals[0], Removal::Removed { .. }));
        assert!(matches!(report.removals[1], Removal::Missing { .. }));
        assert!(!temp_dir.path().join("a.profs/old").exists());

        let after = model_of(&paths, &[&a, &b]);
        assert_eq!(
            after.detected_profile_names().len(),
            model.detected_profile_names().len() - 1
        );
    }

    #[test]
    fn test_remove_active_profile_fails_without_changes() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "work"]);
        let b = make_profiles(&temp_dir, "b", &["home", "work"]);
        activate(&a, "home");
        activate(&b, "work");

        let model = model_of(&paths, &[&a, &b]);
        let err = remove_profile(&model, "work").unwrap_err();
        assert!(matches!(profs_error(&err), ProfsError::ProfileActive(n) if n == "work"));
        assert!(temp_dir.path().join("a.profs/work").exists());
        assert!(temp_dir.path().join("b.profs/work").exists());
    }

    #[test]
    fn test_remove_unknown_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home"]);
        activate(&a, "home");

        let model = model_of(&paths, &[&a]);
        let err = remove_profile(&model, "nope").unwrap_err();
        assert!(matches!(profs_error(&err), ProfsError::ProfileNotFound { .. }));
    }
}

//! Profile switching logic.
//!
//! This module implements the core mechanism of `profs`: pointing every
//! managed path at the same named profile. It handles:
//! - Skipping paths whose state the switch must not paper over.
//! - Skipping paths that have no snapshot for the requested profile.
//! - Refusing to overwrite a real file or directory at a managed path.
//! - Replacing existing (possibly dangling) symlinks.
//!
//! Switching is not transactional. When a path fails midway, the paths before
//! it stay switched and the error says how many were done.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::error::ProfsError;
use crate::fs_utils::{entry_exists, is_symlink, make_symlink, remove_entry};
use crate::model::{ConfigModel, ManagedPath, Status};

/// Why a path was left alone during a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path's status is one the switch refuses to touch
    Status(Status),
    /// The companion dir has no entry for the requested profile
    NotDetected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub src_path: PathBuf,
    pub reason: SkipReason,
}

/// Result of [`switch_profile`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchReport {
    pub switched: Vec<PathBuf>,
    pub skipped: Vec<Skipped>,
}

/// Statuses a switch may overwrite
fn switchable(status: Status) -> bool {
    match status {
        Status::Ok | Status::ErrorTgtNotFound | Status::ErrorSrcNotFound => true,
        Status::ErrorSrcNotSymlink | Status::ErrorTgtUnresolvable => false,
    }
}

/// Point every eligible managed path at profile `name`
pub fn switch_profile(model: &ConfigModel, name: &str) -> Result<SwitchReport> {
    let detected = model.detected_profile_names();
    if !detected.iter().any(|n| n == name) {
        bail!(ProfsError::ProfileNotFound {
            name: name.to_string(),
            available: detected,
        });
    }

    let mut report = SwitchReport::default();
    for path in &model.paths {
        if !switchable(path.status) {
            report.skipped.push(Skipped {
                src_path: path.src_path.clone(),
                reason: SkipReason::Status(path.status),
            });
            continue;
        }

        let Some(profile) = path.find_profile(name) else {
            report.skipped.push(Skipped {
                src_path: path.src_path.clone(),
                reason: SkipReason::NotDetected,
            });
            continue;
        };

        relink(path, &profile.path).with_context(|| {
            format!(
                "Switched {} of {} paths to '{}' before failing",
                report.switched.len(),
                model.paths.len(),
                name
            )
        })?;
        report.switched.push(path.src_path.clone());
    }

    Ok(report)
}

fn relink(path: &ManagedPath, target: &std::path::Path) -> Result<()> {
    let src = &path.src_path;
    if entry_exists(src)? {
        if !is_symlink(src)? {
            bail!(ProfsError::NotASymlink(src.clone()));
        }
        remove_entry(src)?;
    }
    make_symlink(target, src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{activate, make_profiles, model_of, setup_test_paths};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_switch_all_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "test"]);
        let b = make_profiles(&temp_dir, "b", &["home", "test"]);
        activate(&a, "home");
        activate(&b, "home");

        let model = model_of(&paths, &[&a, &b]);
        let report = switch_profile(&model, "test").unwrap();
        assert_eq!(report.switched, vec![a.clone(), b.clone()]);
        assert!(report.skipped.is_empty());

        let model = model_of(&paths, &[&a, &b]);
        assert_eq!(model.active_profile_names(), vec!["test"]);
        assert!(model.all_resolved());
    }

    #[test]
    fn test_switch_fixes_missing_and_dangling_links() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["test"]);
        let b = make_profiles(&temp_dir, "b", &["test"]);
        activate(&b, "deleted");

        let model = model_of(&paths, &[&a, &b]);
        assert_eq!(model.paths[0].status, Status::ErrorSrcNotFound);
        assert_eq!(model.paths[1].status, Status::ErrorTgtNotFound);

        switch_profile(&model, "test").unwrap();
        let model = model_of(&paths, &[&a, &b]);
        assert!(model.all_resolved());
        assert_eq!(model.active_profile_names(), vec!["test"]);
    }

    #[test]
    fn test_switch_skips_unswitchable_and_undetected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "test"]);
        let b = make_profiles(&temp_dir, "b", &["home"]);
        let c = make_profiles(&temp_dir, "c", &["test"]);
        activate(&a, "home");
        activate(&b, "home");
        let elsewhere = temp_dir.path().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        std::os::unix::fs::symlink(&elsewhere, &c).unwrap();

        let model = model_of(&paths, &[&a, &b, &c]);
        let report = switch_profile(&model, "test").unwrap();
        assert_eq!(report.switched, vec![a.clone()]);
        assert_eq!(
            report.skipped,
            vec![
                Skipped {
                    src_path: b.clone(),
                    reason: SkipReason::NotDetected
                },
                Skipped {
                    src_path: c.clone(),
                    reason: SkipReason::Status(Status::ErrorTgtUnresolvable)
                },
            ]
        );
    }

    #[test]
    fn test_switch_unknown_profile() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["test"]);
        activate(&a, "test");

        let model = model_of(&paths, &[&a]);
        let err = switch_profile(&model, "testx").unwrap_err();
        assert!(err.to_string().contains("Profile 'testx' not found"));
    }

    #[test]
    fn test_switch_refuses_real_directory_that_appeared() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["test"]);
        let b = make_profiles(&temp_dir, "b", &["test"]);

        // resolved while both paths were missing; b becomes a real dir afterwards
        let model = model_of(&paths, &[&a, &b]);
        fs::create_dir(&b).unwrap();

        let err = switch_profile(&model, "test").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProfsError>(),
            Some(ProfsError::NotASymlink(p)) if *p == b
        ));
        assert!(err.to_string().contains("Switched 1 of 2 paths"));
        // the first path stays switched
        assert!(fs::symlink_metadata(&a).unwrap().file_type().is_symlink());
    }
}

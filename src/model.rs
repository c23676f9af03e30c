//! Resolved view of the managed paths.
//!
//! Nothing here is cached: [`resolve`] reads the raw config entries and the
//! filesystem and builds a fresh [`ConfigModel`] every time it is called.
//! Operations take that model by reference and never patch it in place.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RawConfig;
use crate::fs_utils::{absolute_link_target, clean_path, entry_exists, is_symlink, target_exists};
use crate::paths::{Paths, companion_dir};
use crate::profiles::{Profile, scan_profiles};

/// Consistency state of one managed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Symlink into the companion dir, pointing at a detected profile
    Ok,
    ErrorSrcNotFound,
    ErrorSrcNotSymlink,
    ErrorTgtNotFound,
    /// Target exists but is not one of the detected profiles
    ErrorTgtUnresolvable,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Short machine-style tag, matching the JSON representation
    pub fn tag(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::ErrorSrcNotFound => "error_src_not_found",
            Status::ErrorSrcNotSymlink => "error_src_not_symlink",
            Status::ErrorTgtNotFound => "error_tgt_not_found",
            Status::ErrorTgtUnresolvable => "error_tgt_unresolvable",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::ErrorSrcNotFound => "path does not exist",
            Status::ErrorSrcNotSymlink => "path is not a symlink",
            Status::ErrorTgtNotFound => "symlink target does not exist",
            Status::ErrorTgtUnresolvable => "symlink target is not a known profile",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One managed path as found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedPath {
    pub src_path: PathBuf,
    pub status: Status,
    /// Absolute symlink target, only when `src_path` is a symlink
    pub tgt_path: Option<PathBuf>,
    pub resolved_profile: Option<Profile>,
    pub detected_profiles: Vec<Profile>,
}

impl ManagedPath {
    /// The sibling `<src>.profs` directory
    pub fn companion_dir(&self) -> PathBuf {
        companion_dir(&self.src_path)
    }

    pub fn find_profile(&self, name: &str) -> Option<&Profile> {
        self.detected_profiles.iter().find(|p| p.name == name)
    }

    pub fn active_profile_name(&self) -> Option<&str> {
        self.resolved_profile.as_ref().map(|p| p.name.as_str())
    }
}

/// Classify one expanded managed path against the filesystem
pub fn classify_path(src_path: &Path) -> Result<ManagedPath> {
    let detected_profiles = scan_profiles(&companion_dir(src_path))?;

    let mut managed = ManagedPath {
        src_path: src_path.to_path_buf(),
        status: Status::ErrorSrcNotFound,
        tgt_path: None,
        resolved_profile: None,
        detected_profiles,
    };

    if !entry_exists(src_path)? {
        return Ok(managed);
    }

    if !is_symlink(src_path)? {
        managed.status = Status::ErrorSrcNotSymlink;
        return Ok(managed);
    }

    let target = absolute_link_target(src_path)?;
    managed.tgt_path = Some(target.clone());

    if !target_exists(&target)? {
        managed.status = Status::ErrorTgtNotFound;
        return Ok(managed);
    }

    let wanted = clean_path(&target);
    match managed
        .detected_profiles
        .iter()
        .find(|p| clean_path(&p.path) == wanted)
    {
        Some(profile) => {
            managed.resolved_profile = Some(profile.clone());
            managed.status = Status::Ok;
        }
        None => managed.status = Status::ErrorTgtUnresolvable,
    }

    Ok(managed)
}

/// All managed paths, classified
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigModel {
    pub paths: Vec<ManagedPath>,
}

/// Build the model from the raw config entries and the current filesystem
pub fn resolve(raw: &RawConfig, paths: &Paths) -> Result<ConfigModel> {
    let managed = raw
        .paths
        .iter()
        .map(|entry| {
            let src = paths.expand_home(entry);
            classify_path(&src).with_context(|| format!("Failed to inspect managed path '{}'", entry))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ConfigModel { paths: managed })
}

impl ConfigModel {
    /// Every profile name found in any companion dir, first-seen order
    pub fn detected_profile_names(&self) -> Vec<String> {
        unique(
            self.paths
                .iter()
                .flat_map(|p| p.detected_profiles.iter().map(|prof| prof.name.as_str())),
        )
    }

    /// Names of the profiles the managed paths currently resolve to.
    /// More than one entry means the paths disagree.
    pub fn active_profile_names(&self) -> Vec<String> {
        unique(self.paths.iter().filter_map(|p| p.active_profile_name()))
    }

    pub fn all_resolved(&self) -> bool {
        self.paths.iter().all(|p| p.status.is_ok())
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{activate, make_profiles, model_of, setup_test_paths};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_src_and_companion() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a");

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.src_path, src);
        assert_eq!(managed.status, Status::ErrorSrcNotFound);
        assert!(managed.detected_profiles.is_empty());
        assert!(managed.tgt_path.is_none());
        assert!(managed.resolved_profile.is_none());
    }

    #[test]
    fn test_plain_directory_is_not_symlink() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["work"]);
        fs::create_dir(&src).unwrap();

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::ErrorSrcNotSymlink);
        assert_eq!(managed.detected_profiles.len(), 1);
    }

    #[test]
    fn test_symlink_to_profile_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["home", "work"]);
        activate(&src, "work");

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::Ok);
        assert_eq!(managed.active_profile_name(), Some("work"));
        assert_eq!(
            managed.tgt_path,
            Some(temp_dir.path().join("a.profs").join("work"))
        );
    }

    #[test]
    fn test_relative_symlink_resolves_against_parent() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["work"]);
        std::os::unix::fs::symlink("./a.profs/../a.profs/work", &src).unwrap();

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::Ok);
        assert_eq!(managed.active_profile_name(), Some("work"));
    }

    #[test]
    fn test_dangling_symlink_is_tgt_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["work"]);
        activate(&src, "gone");

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::ErrorTgtNotFound);
        assert!(managed.tgt_path.is_some());
        assert!(managed.resolved_profile.is_none());
    }

    #[test]
    fn test_foreign_target_is_unresolvable() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["work"]);
        let elsewhere = temp_dir.path().join("elsewhere");
        fs::create_dir(&elsewhere).unwrap();
        std::os::unix::fs::symlink(&elsewhere, &src).unwrap();

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::ErrorTgtUnresolvable);
    }

    #[test]
    fn test_target_reached_through_another_link_is_unresolvable() {
        let temp_dir = TempDir::new().unwrap();
        let src = make_profiles(&temp_dir, "a", &["work"]);
        let alias = temp_dir.path().join("alias");
        std::os::unix::fs::symlink(temp_dir.path().join("a.profs"), &alias).unwrap();
        std::os::unix::fs::symlink(alias.join("work"), &src).unwrap();

        let managed = classify_path(&src).unwrap();
        assert_eq!(managed.status, Status::ErrorTgtUnresolvable);
    }

    #[test]
    fn test_profile_names_dedup_in_first_seen_order() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["beta", "alpha"]);
        let b = make_profiles(&temp_dir, "b", &["gamma", "beta"]);
        activate(&a, "alpha");
        activate(&b, "beta");

        let model = model_of(&paths, &[&a, &b]);
        assert_eq!(model.detected_profile_names(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(model.active_profile_names(), vec!["alpha", "beta"]);
        assert!(model.all_resolved());
    }

    #[test]
    fn test_all_resolved_false_with_broken_path() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["work"]);
        activate(&a, "work");
        let b = temp_dir.path().join("b");

        let model = model_of(&paths, &[&a, &b]);
        assert!(!model.all_resolved());
        assert_eq!(model.active_profile_names(), vec!["work"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let a = make_profiles(&temp_dir, "a", &["home", "work"]);
        activate(&a, "home");
        let b = make_profiles(&temp_dir, "b", &["home"]);

        let first = model_of(&paths, &[&a, &b]);
        let second = model_of(&paths, &[&a, &b]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_expands_home_entries() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let raw = RawConfig {
            paths: vec!["~/a".to_string()],
        };

        let model = resolve(&raw, &paths).unwrap();
        assert_eq!(model.paths[0].src_path, temp_dir.path().join("a"));
        assert_eq!(model.paths[0].status, Status::ErrorSrcNotFound);
    }

    #[test]
    fn test_status_serializes_as_tag() {
        let json = serde_json::to_string(&Status::ErrorTgtNotFound).unwrap();
        assert_eq!(json, format!("\"{}\"", Status::ErrorTgtNotFound.tag()));
    }
}

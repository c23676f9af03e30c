//! Test utilities shared across test modules
//!
//! Builds sandboxed [`Paths`] and managed-path fixtures inside a temp dir so
//! no test ever touches the real home or config directory.

use crate::config::RawConfig;
use crate::model::{ConfigModel, resolve};
use crate::paths::{Paths, companion_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a Paths struct for testing using a temporary directory
///
/// The temp dir plays the role of the home directory; the config lives in
/// `<tmp>/.config/profs` with the legacy location at `<tmp>/.profs`.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    let home = temp_dir.path().to_path_buf();
    Paths {
        config_dir: home.join(".config/profs"),
        legacy_config_dir: home.join(".profs"),
        config_file: home.join(".config/profs/global.json"),
        home_dir: home,
    }
}

/// Create `<home>/<name>.profs/<profile>` for each profile, returning the managed path
pub fn make_profiles(temp_dir: &TempDir, name: &str, profiles: &[&str]) -> PathBuf {
    let src = temp_dir.path().join(name);
    for profile in profiles {
        let dir = companion_dir(&src).join(profile);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("marker"), profile).unwrap();
    }
    src
}

/// Point `src` at `<src>.profs/<profile>`
pub fn activate(src: &Path, profile: &str) {
    if fs::symlink_metadata(src).is_ok() {
        fs::remove_file(src).unwrap();
    }
    std::os::unix::fs::symlink(companion_dir(src).join(profile), src).unwrap();
}

/// Resolve a model over the given managed paths
pub fn model_of(paths: &Paths, srcs: &[&Path]) -> ConfigModel {
    let raw = RawConfig {
        paths: srcs.iter().map(|p| paths.abbreviate_home(p)).collect(),
    };
    resolve(&raw, paths).unwrap()
}

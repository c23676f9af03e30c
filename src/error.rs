//! Expected, user-facing failure conditions.
//!
//! Unexpected I/O problems travel as plain `anyhow` errors with context.
//! Everything in [`ProfsError`] is a condition the tool checks for on purpose,
//! so callers (and tests) can `downcast_ref::<ProfsError>()` to tell them apart.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::Status;

#[derive(Debug, Error)]
pub enum ProfsError {
    #[error("No active profile found")]
    NoActiveProfile,

    #[error("Multiple active profiles found ({})", .0.join(", "))]
    MultipleActiveProfiles(Vec<String>),

    #[error("Path '{}' already exists in configuration, aborting", .0.display())]
    PathAlreadyConfigured(PathBuf),

    #[error("Path '{0}' does not exist in configuration, aborting")]
    PathNotConfigured(String),

    #[error(
        "Path is already a symlink, but does not point to a profile in .profs, aborting\n  Path: {}\n  Parent of target: {}\n  Expected parent: {}",
        .path.display(),
        .target_parent.display(),
        .companion.display()
    )]
    ForeignSymlink {
        path: PathBuf,
        target_parent: PathBuf,
        companion: PathBuf,
    },

    #[error("Path {} already exists and is not a symlink, please remove it before setting the profile", .0.display())]
    NotASymlink(PathBuf),

    #[error("Profile '{name}' not found{}", available_hint(.available))]
    ProfileNotFound { name: String, available: Vec<String> },

    #[error("Profile name '{0}' already exists, please choose a different name")]
    ProfileExists(String),

    #[error("Cannot remove active profile '{0}'. Please activate another profile first.")]
    ProfileActive(String),

    #[error("Cannot add profile '{name}' to path '{}' because it is not valid: {status}, aborting", .path.display())]
    PathNotReady {
        name: String,
        path: PathBuf,
        status: Status,
    },

    #[error("No profiles detected, nothing to do. Add at least one profile first")]
    NoProfiles,

    #[error("No managed paths configured. Add one with 'profs add <path> --profile <name>'")]
    NoManagedPaths,

    #[error("Invalid profile name '{name}': {reason}")]
    InvalidProfileName { name: String, reason: &'static str },

    #[error("Found {0} inconsistencies, please review the warnings above.")]
    Inconsistent(usize),

    #[error("No legacy configuration found at {}, nothing to migrate", .0.display())]
    LegacyConfigMissing(PathBuf),

    #[error("New configuration directory already exists at {}, please remove it before migrating", .0.display())]
    ConfigDirExists(PathBuf),

    #[error("{0}")]
    Aborted(String),
}

fn available_hint(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available profiles: {}", available.join(", "))
    }
}

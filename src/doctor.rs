//! Consistency audit for profs.
//!
//! This module implements `profs doctor`, a read-only check that all managed
//! paths agree with each other:
//! - Every managed path is a symlink.
//! - Every path points at the one globally active profile.
//! - Every profile known anywhere exists in every companion directory.
//!
//! Findings are collected, never fixed.

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::error::ProfsError;
use crate::model::{ConfigModel, Status};

/// A single inconsistency found on one managed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    NotSymlink,
    /// Symlink exists but does not resolve to a detected profile
    Unresolved(Status),
    ActiveMismatch { found: String, expected: String },
    MissingProfile(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    pub src_path: PathBuf,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorReport {
    pub active_profile: String,
    pub checks: Vec<PathCheck>,
}

impl DoctorReport {
    pub fn warning_count(&self) -> usize {
        self.checks.iter().map(|c| c.findings.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.warning_count() == 0
    }
}

/// Audit the model. Needs at least one profile and exactly one active profile.
pub fn run_doctor(model: &ConfigModel) -> Result<DoctorReport> {
    let all_profiles = model.detected_profile_names();
    if all_profiles.is_empty() {
        bail!(ProfsError::NoProfiles);
    }

    let mut active = model.active_profile_names();
    let active_profile = match active.len() {
        0 => bail!(ProfsError::NoActiveProfile),
        1 => active.remove(0),
        _ => bail!(ProfsError::MultipleActiveProfiles(active)),
    };

    let checks = model
        .paths
        .iter()
        .map(|path| {
            let mut findings = Vec::new();

            match path.status {
                Status::ErrorSrcNotFound | Status::ErrorSrcNotSymlink => {
                    findings.push(Finding::NotSymlink);
                    return PathCheck {
                        src_path: path.src_path.clone(),
                        findings,
                    };
                }
                Status::ErrorTgtNotFound | Status::ErrorTgtUnresolvable => {
                    findings.push(Finding::Unresolved(path.status));
                }
                Status::Ok => {}
            }

            if let Some(found) = path
                .active_profile_name()
                .filter(|found| *found != active_profile)
            {
                findings.push(Finding::ActiveMismatch {
                    found: found.to_string(),
                    expected: active_profile.clone(),
                });
            }

            for name in &all_profiles {
                if path.find_profile(name).is_none() {
                    findings.push(Finding::MissingProfile(name.clone()));
                }
            }

            PathCheck {
                src_path: path.src_path.clone(),
                findings,
            }
        })
        .collect();

    Ok(DoctorReport {
        active_profile,
        checks,
    })
}

//! High-level command orchestration for the CLI.
//!
//! Each function here corresponds to a subcommand in `main.rs`. They all
//! follow the same shape: load the raw config, resolve a fresh model, call
//! one operation and render its report through `Ui`. The operations
//! themselves never print.

use anyhow::{Context, Result, bail};
use inquire::Confirm;
use std::path::Path;

use crate::config::{self, RawConfig};
use crate::doctor::{Finding, run_doctor};
use crate::error::ProfsError;
use crate::manage::{Notice, add_path, configured_entries, remove_path};
use crate::model::{ConfigModel, ManagedPath, resolve};
use crate::paths::Paths;
use crate::profiles::{
    Removal, add_profile as create_profile, find_profile_name, remove_profile as delete_profile,
};
use crate::switch::{SkipReason, switch_profile};
use crate::ui::Ui;

/// Load the raw config and resolve it against the filesystem
fn load_model(paths: &Paths, ui: &Ui) -> Result<(RawConfig, ConfigModel)> {
    ui.debug(format!("config file: {}", paths.config_file.display()));
    let raw = RawConfig::load(&paths.config_file)?;
    let model = resolve(&raw, paths)?;
    for path in &model.paths {
        ui.debug(format!(
            "{} -> {} [{}]",
            path.src_path.display(),
            path.tgt_path
                .as_ref()
                .map(|t| t.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            path.status
        ));
    }
    Ok((raw, model))
}

/// Ask for confirmation unless `yes` was given. Declining aborts the command.
fn confirm(prompt: &str, yes: bool, abort_msg: String) -> Result<()> {
    if yes {
        return Ok(());
    }
    let accepted = Confirm::new(prompt)
        .with_default(false)
        .prompt()
        .context("Confirmation cancelled")?;
    if !accepted {
        bail!(ProfsError::Aborted(abort_msg));
    }
    Ok(())
}

fn display_target(paths: &Paths, path: &ManagedPath) -> String {
    path.tgt_path
        .as_ref()
        .map(|t| paths.abbreviate_home(t))
        .unwrap_or_default()
}

/// Show managed paths grouped by the profile they point at
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;

    if model.is_empty() {
        ui.warn("No managed paths configured.");
        ui.newline();
        ui.println("Start managing one with:");
        ui.println(format!("  {} add <path> --profile <name>", ui.bold("profs")));
        return Ok(());
    }

    let mut groups: Vec<(Option<&str>, Vec<&ManagedPath>)> = Vec::new();
    for path in &model.paths {
        let key = path.active_profile_name();
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(path),
            None => groups.push((key, vec![path])),
        }
    }

    for (profile, members) in groups {
        ui.section(format!("Profile: {}", profile.unwrap_or("(none)")));
        let mut table = ui.simple_table();
        table.set_header(vec![
            ui.header_cell("Path"),
            ui.header_cell("Target"),
            ui.header_cell("Status"),
        ]);
        for path in members {
            table.add_row(vec![
                ui.cell(paths.abbreviate_home(&path.src_path)),
                ui.cell(display_target(paths, path)),
                ui.status_cell(path.status),
            ]);
        }
        ui.println(table.to_string());
        ui.newline();
    }

    Ok(())
}

/// List every detected profile name
pub fn list_profiles(paths: &Paths, ui: &Ui) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;
    let names = model.detected_profile_names();
    if names.is_empty() {
        ui.println("No profiles detected");
        return Ok(());
    }

    let active = model.active_profile_names();
    ui.section("Detected profiles:");
    for name in names {
        if active.contains(&name) {
            ui.println(format!("  {} {}", name, ui.dim("(active)")));
        } else {
            ui.println(format!("  {}", name));
        }
    }
    Ok(())
}

/// Print the active profile, or explain why there isn't exactly one
pub fn status_profile(paths: &Paths, ui: &Ui) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;
    let active = model.active_profile_names();
    match active.as_slice() {
        [] => ui.println("No active profiles"),
        [name] => {
            ui.println(name);
            if !model.all_resolved() {
                ui.warn("Not all configured paths resolved!");
                ui.println(" -> Run 'profs list' to see the status of every path");
            }
        }
        names => {
            ui.warn("Multiple active profiles:");
            for name in names {
                ui.println(format!("  {}", name));
            }
            ui.println(" -> Run 'profs list' to see the status of every path");
        }
    }
    Ok(())
}

/// Print the raw config JSON as stored
pub fn status_config(paths: &Paths, ui: &Ui) -> Result<()> {
    let raw = RawConfig::load(&paths.config_file)?;
    ui.println(serde_json::to_string_pretty(&raw).context("Failed to serialize global config")?);
    Ok(())
}

/// Print the fully resolved model as JSON
pub fn status_full(paths: &Paths, ui: &Ui) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;
    ui.println(serde_json::to_string_pretty(&model).context("Failed to serialize status")?);
    Ok(())
}

/// Start managing a path
pub fn add(paths: &Paths, ui: &Ui, path: &Path, profile: Option<&str>) -> Result<()> {
    let (mut raw, model) = load_model(paths, ui)?;
    let outcome = add_path(paths, &mut raw, &model, path, profile)?;

    for notice in &outcome.notices {
        match notice {
            Notice::AlreadyManaged(p) => ui.warn(format!(
                "{} is already a symlink managed by profs, skipping",
                p.display()
            )),
            Notice::CreatedMissing(p) => {
                ui.warn(format!("{} did not exist, created it empty", p.display()))
            }
            Notice::SnapshotExists(p) => {
                ui.warn(format!("{} already exists, skipping move", p.display()))
            }
        }
    }

    ui.ok(format!(
        "Now managing {} (profile '{}')",
        outcome.stored_as, outcome.profile
    ));
    Ok(())
}

/// Stop managing a path (config only)
pub fn remove(paths: &Paths, ui: &Ui, entry: &str, yes: bool) -> Result<()> {
    let mut raw = RawConfig::load(&paths.config_file)?;
    ui.debug(format!("configured paths: {}", raw.paths.join(", ")));

    let matching = configured_entries(paths, &raw, entry)?;
    confirm(
        &format!("Remove '{}' from the profs configuration?", matching.join("', '")),
        yes,
        format!("Aborting removal of path {}", entry),
    )?;

    let removed = remove_path(paths, &mut raw, entry)?;
    for entry in removed {
        ui.ok(format!("Removed {} from configuration", entry));
    }
    ui.info("Symlinks and .profs directories were left in place");
    Ok(())
}

/// Switch every managed path to profile `name`
pub fn set(paths: &Paths, ui: &Ui, name: &str) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;

    let spinner = ui.spinner(format!("Switching to profile '{}'...", name));
    let report = match switch_profile(&model, name) {
        Ok(report) => report,
        Err(e) => {
            ui.spinner_finish_err(&spinner, format!("Failed to switch to '{}'", name));
            return Err(e);
        }
    };

    for path in &report.switched {
        ui.debug(format!("switched {}", path.display()));
    }
    if report.skipped.is_empty() {
        ui.spinner_finish_ok(
            &spinner,
            format!("Active profile: {} ({} paths)", name, report.switched.len()),
        );
    } else {
        ui.spinner_finish_ok(
            &spinner,
            format!(
                "Active profile: {} ({} of {} paths)",
                name,
                report.switched.len(),
                model.paths.len()
            ),
        );
    }

    for skipped in &report.skipped {
        let why = match &skipped.reason {
            SkipReason::Status(status) => format!("it has status {} ({})", status, status.describe()),
            SkipReason::NotDetected => "the profile is not detected there".to_string(),
        };
        ui.warn(format!(
            "Unable to set profile {} for path {}, because {}",
            name,
            paths.abbreviate_home(&skipped.src_path),
            why
        ));
    }
    Ok(())
}

/// Create a new profile next to every managed path
pub fn add_profile(paths: &Paths, ui: &Ui, name: &str, copy_existing: bool) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;
    let created = create_profile(&model, name, copy_existing)?;

    for entry in &created {
        ui.debug(format!("created {}", entry.profile_path.display()));
    }
    match created.first().and_then(|c| c.copied_from.as_deref()) {
        Some(source) => ui.ok(format!(
            "Created profile '{}' from '{}' in {} paths",
            name,
            source,
            created.len()
        )),
        None => ui.ok(format!(
            "Created empty profile '{}' in {} paths",
            name,
            created.len()
        )),
    }
    ui.println(format!("To activate it:\n  profs set {}", name));
    Ok(())
}

/// Delete a profile from every managed path
pub fn remove_profile(paths: &Paths, ui: &Ui, name: &str, yes: bool) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;

    if find_profile_name(&model, name).is_none() {
        bail!(ProfsError::ProfileNotFound {
            name: name.to_string(),
            available: model.detected_profile_names(),
        });
    }
    confirm(
        &format!("Are you sure you want to remove the profile '{}'?", name),
        yes,
        format!("Aborting removal of profile {}", name),
    )?;

    let report = delete_profile(&model, name)?;
    for removal in &report.removals {
        match removal {
            Removal::Removed { src_path, .. } => ui.ok(format!(
                "Removed profile '{}' from path '{}'",
                report.name,
                paths.abbreviate_home(src_path)
            )),
            Removal::Missing { src_path } => ui.info(format!(
                "Profile '{}' does not exist in path '{}', skipping",
                report.name,
                paths.abbreviate_home(src_path)
            )),
        }
    }
    Ok(())
}

/// Report inconsistencies; fails when any were found
pub fn doctor(paths: &Paths, ui: &Ui) -> Result<()> {
    let (_, model) = load_model(paths, ui)?;
    let report = run_doctor(&model)?;

    ui.section("profs Doctor");
    ui.println(format!("Active profile: {}", report.active_profile));
    ui.newline();

    for check in &report.checks {
        let src = paths.abbreviate_home(&check.src_path);
        if check.findings.is_empty() {
            ui.println(format!("  {} {}", ui.icon_ok(), src));
            continue;
        }
        ui.println(format!("  {} {}", ui.icon_warn(), src));
        for finding in &check.findings {
            let msg = match finding {
                Finding::NotSymlink => {
                    "not a symlink, expected a symlink to a profile directory".to_string()
                }
                Finding::Unresolved(status) => {
                    format!("symlink does not resolve to a profile: {}", status.describe())
                }
                Finding::ActiveMismatch { found, expected } => {
                    format!("active profile is '{}', expected '{}'", found, expected)
                }
                Finding::MissingProfile(name) => format!("profile '{}' is missing", name),
            };
            ui.println(format!("      {} {}", ui.icon_err(), msg));
        }
    }
    ui.newline();

    if report.is_clean() {
        ui.ok("No inconsistencies found, everything seems to be in order.");
        Ok(())
    } else {
        bail!(ProfsError::Inconsistent(report.warning_count()))
    }
}

/// Wipe the configuration (symlinks stay intact)
pub fn reset(paths: &Paths, ui: &Ui, yes: bool) -> Result<()> {
    confirm(
        "Reset all configuration? Symlinks and .profs directories remain intact.",
        yes,
        "Aborting reset".to_string(),
    )?;
    let fresh = config::reset(paths)?;
    ui.ok(format!("Re-initialized configuration: {}", fresh.display()));
    Ok(())
}

/// Move the legacy config dir to its new home
pub fn migrate_config_dir(paths: &Paths, ui: &Ui, yes: bool) -> Result<()> {
    if !paths.legacy_config_dir.is_dir() {
        bail!(ProfsError::LegacyConfigMissing(paths.legacy_config_dir.clone()));
    }
    confirm(
        &format!(
            "Migrate the configuration dir from {} to {}?",
            paths.legacy_config_dir.display(),
            paths.config_dir.display()
        ),
        yes,
        "Aborting migration".to_string(),
    )?;
    config::migrate_config_dir(paths)?;
    ui.ok(format!(
        "Migrated configuration from {} to {}",
        paths.legacy_config_dir.display(),
        paths.config_dir.display()
    ));
    Ok(())
}

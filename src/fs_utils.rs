//! Filesystem utility functions
//!
//! Thin wrappers over `std::fs` that distinguish "does not exist" from real
//! I/O failures, plus lexical path cleaning.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Lexically clean a path: drop `.` segments, fold `..` into its parent and
/// collapse repeated separators. Symlinks are never followed, so two paths
/// that only meet after resolving a link stay different.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Make a path absolute against the current directory, then clean it
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(clean_path(path));
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(clean_path(&cwd.join(path)))
}

/// Whether anything (including a dangling symlink) exists at `path`
pub fn entry_exists(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to stat path: {}", path.display())),
    }
}

/// Whether `path` exists after following symlinks
pub fn target_exists(path: &Path) -> Result<bool> {
    path.try_exists()
        .with_context(|| format!("Failed to stat path: {}", path.display()))
}

/// Whether `path` itself is a symlink (false when missing)
pub fn is_symlink(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(meta.file_type().is_symlink()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to get file info: {}", path.display())),
    }
}

/// Read a symlink and make a relative target absolute against the link's parent
pub fn absolute_link_target(link: &Path) -> Result<PathBuf> {
    let target = fs::read_link(link)
        .with_context(|| format!("Failed to read symlink target: {}", link.display()))?;
    if target.is_absolute() {
        return Ok(target);
    }
    let parent = link.parent().unwrap_or_else(|| Path::new("/"));
    Ok(parent.join(target))
}

/// Create a symlink at `link` pointing to `target`, creating parents of `link`
pub fn make_symlink(target: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link).with_context(|| {
        format!(
            "Failed to create symlink from {} to {}",
            link.display(),
            target.display()
        )
    })?;

    #[cfg(windows)]
    {
        let result = if target.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.with_context(|| {
            format!(
                "Failed to create symlink from {} to {}",
                link.display(),
                target.display()
            )
        })?;
    }

    Ok(())
}

/// Remove whatever sits at `path` without following a symlink there
pub fn remove_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)
        .with_context(|| format!("Failed to stat path: {}", path.display()))?;
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.with_context(|| format!("Failed to remove {}", path.display()))
}

/// Recursively copy a directory and all its contents to a new location
///
/// Symlinks inside the tree are recreated as symlinks with the same target.
///
/// # Errors
/// Returns an error if:
/// - Source doesn't exist or is not a directory
/// - Destination cannot be created
/// - Any file or directory cannot be copied
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        bail!("Source directory does not exist: {:?}", src);
    }

    if !src.is_dir() {
        bail!("Source is not a directory: {:?}", src);
    }

    fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create destination directory: {:?}", dst))?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read source directory: {:?}", src))?
    {
        let entry = entry.context("Failed to read directory entry")?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to get file type: {:?}", src_path))?;

        if file_type.is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("Failed to read symlink: {:?}", src_path))?;
            make_symlink(&target, &dst_path)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!("Failed to copy file: {:?} -> {:?}", src_path, dst_path)
            })?;
        }
    }

    Ok(())
}

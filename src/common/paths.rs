//! Utilities for path checking and directory management.

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Ensure a directory exists, creating it if necessary.
///
/// Convenience wrapper around fs::create_dir_all that doesn't fail
/// if the directory already exists.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Extract the base name of a path as a string.
///
/// Fails on paths that have no final component (e.g. `/` or an empty path).
pub fn base_name(path: &Path) -> Result<String> {
    match path.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => bail!("Path has no base name: {}", path.display()),
    }
}

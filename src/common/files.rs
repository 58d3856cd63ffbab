//! Utilities for file operations with automatic parent directory creation.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use walkdir::WalkDir;

/// Write a file, creating parent directories as needed.
///
/// # Arguments
/// * `path` - Path to the file to write
/// * `content` - Content to write (anything that implements AsRef<[u8]>)
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Write a file with specific Unix permissions, creating parent directories as needed.
///
/// # Arguments
/// * `path` - Path to the file to write
/// * `content` - Content to write
/// * `mode` - Unix permission bits (e.g., 0o755, 0o644)
pub fn write_file_mode<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
    mode: u32,
) -> Result<()> {
    let path = path.as_ref();
    write_file_with_dirs(path, content)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Copy a directory tree, preserving relative layout and file modes.
///
/// Symlinks inside the tree are copied as the files they point at.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir entry outside its root");
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} -> {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            let mode = fs::metadata(entry.path())?.permissions().mode();
            fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_mode_sets_permissions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/script.sh");

        write_file_mode(&path, "#!/bin/sh\n", 0o755).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_copy_dir_recursive_preserves_layout() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");

        fs::create_dir_all(src.join("sub/deeper")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("sub/deeper/leaf.txt"), "leaf").unwrap();

        copy_dir_recursive(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dst.join("sub/deeper/leaf.txt")).unwrap(),
            "leaf"
        );
    }
}

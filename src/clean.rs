//! Build artifact cleaning.

use anyhow::Result;
use std::fs;

use crate::config::Config;

/// Remove the build tree for one tag.
pub fn clean_tag(config: &Config, tag: &str) -> Result<()> {
    let dir = config.build_root.join(tag);
    if dir.exists() {
        println!("Removing {}...", dir.display());
        fs::remove_dir_all(&dir)?;
        println!("Clean complete.");
    } else {
        println!("Nothing to clean for tag '{tag}'.");
    }
    Ok(())
}

/// Remove the whole build root.
pub fn clean_all(config: &Config) -> Result<()> {
    let dir = &config.build_root;
    if dir.exists() {
        println!("Removing {}...", dir.display());
        fs::remove_dir_all(dir)?;
        println!("Clean complete.");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(base: &Path) -> Config {
        Config {
            busybox: base.join("busybox"),
            container_init: base.join("container_init"),
            vsock_bridge: base.join("vsock_bridge"),
            component_dir: base.join("default"),
            build_root: base.join("build"),
        }
    }

    #[test]
    fn test_clean_tag_removes_only_that_tree() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        fs::create_dir_all(config.build_root.join("t1/initrd")).unwrap();
        fs::create_dir_all(config.build_root.join("t2/initrd")).unwrap();

        clean_tag(&config, "t1").unwrap();

        assert!(!config.build_root.join("t1").exists());
        assert!(config.build_root.join("t2").exists());
    }

    #[test]
    fn test_clean_all_tolerates_missing_build_root() {
        let temp = TempDir::new().unwrap();
        clean_all(&config(temp.path())).unwrap();
    }
}

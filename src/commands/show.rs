//! Show command - prints configuration and build status.

use anyhow::Result;
use std::fs;

use crate::config::Config;
use crate::initrd::BuildManifest;

pub enum ShowTarget {
    Config,
    Status,
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config => {
            config.print();
            Ok(())
        }
        ShowTarget::Status => show_status(config),
    }
}

/// List finished builds under the build root from their manifests.
fn show_status(config: &Config) -> Result<()> {
    if !config.build_root.exists() {
        println!("No builds yet ({} does not exist).", config.build_root.display());
        return Ok(());
    }

    let mut found = false;
    let mut entries: Vec<_> = fs::read_dir(&config.build_root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let dir = entry.path();
        match BuildManifest::read(&dir) {
            Ok(manifest) => {
                found = true;
                let parts = match manifest.rootfs_parts {
                    Some(n) => format!(", {n} rootfs part(s)"),
                    None => String::new(),
                };
                println!(
                    "  {} [{}] {} ({} KB{})",
                    manifest.tag,
                    manifest.mode,
                    manifest.image.display(),
                    manifest.image_size / 1024,
                    parts
                );
            }
            Err(_) => {
                // A tree without a manifest is an unfinished or failed build.
                println!("  {} (incomplete)", entry.file_name().to_string_lossy());
                found = true;
            }
        }
    }

    if !found {
        println!("No builds yet.");
    }
    Ok(())
}

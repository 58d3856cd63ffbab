//! Build manifest: a record of what a finished build produced.
//!
//! Written next to the image as `build/<tag>/manifest.json`; read back
//! by `show status`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::initrd::{BuildContext, BuildReport};

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildManifest {
    pub tag: String,
    pub mode: String,
    pub source: PathBuf,
    pub image: PathBuf,
    pub image_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rootfs_parts: Option<usize>,
}

impl BuildManifest {
    pub fn for_build(ctx: &BuildContext, report: &BuildReport) -> Self {
        Self {
            tag: ctx.request.tag.clone(),
            mode: ctx.request.mode.name().to_string(),
            source: ctx.request.source.clone(),
            image: report.image.clone(),
            image_size: report.image_size,
            rootfs_parts: report.rootfs_parts,
        }
    }

    pub fn write(&self, build_dir: &Path) -> Result<()> {
        let path = build_dir.join(MANIFEST_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn read(build_dir: &Path) -> Result<Self> {
        let path = build_dir.join(MANIFEST_NAME);
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Malformed manifest {}", path.display()))
    }
}

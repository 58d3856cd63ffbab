//! Packaging: serialize the staging tree into the compressed image.
//!
//! The archive is a gzip-compressed newc cpio, the format the kernel
//! expects for an initrd; cpio preserves file modes, directory structure,
//! and the `sh` symlink. The archive root IS the guest's root filesystem
//! view at boot (`/init`, `/bin/...`), which is why the tool runs from
//! inside the staging directory.

use anyhow::{anyhow, Context};
use std::fs;
use std::os::unix::fs::PermissionsExt;

use tracing::info;

use crate::error::BuildError;
use crate::initrd::BuildContext;
use crate::process::CommandRunner;

const GZIP_LEVEL: u32 = 9;

/// Mark the init script executable, then archive and compress the tree.
///
/// The archive is written to a scratch path and renamed into place, so a
/// failed run never leaves a truncated `initrd.img` behind.
pub fn package(ctx: &BuildContext, runner: &dyn CommandRunner) -> Result<(), BuildError> {
    let tag = &ctx.request.tag;
    let packaging_error = |source: anyhow::Error| BuildError::Packaging {
        tag: tag.clone(),
        source,
    };

    let init = ctx.init_path();
    fs::set_permissions(&init, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", init.display()))
        .map_err(packaging_error)?;

    let staging = ctx.staging_dir();
    let image = ctx.image_path();
    let partial = ctx.build_dir().join("initrd.img.partial");

    info!(tag = %tag, image = %image.display(), "packaging staging tree");

    let cmdline = format!(
        "find . -print0 | cpio --null -o -H newc 2>/dev/null | gzip -{} > '{}'",
        GZIP_LEVEL,
        partial.display()
    );
    let result = runner
        .run("sh", &["-c".to_string(), cmdline], Some(&staging))
        .map_err(packaging_error)?;

    if !result.success() {
        let _ = fs::remove_file(&partial);
        let stderr = result.stderr_trimmed();
        let detail = if stderr.is_empty() {
            format!("exit code {}", result.code())
        } else {
            format!("exit code {}: {}", result.code(), stderr)
        };
        return Err(packaging_error(anyhow!("cpio/gzip failed ({detail})")));
    }

    fs::rename(&partial, &image)
        .with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                partial.display(),
                image.display()
            )
        })
        .map_err(packaging_error)?;

    Ok(())
}

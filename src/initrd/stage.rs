//! Staging: assemble the on-disk tree that becomes the guest's root
//! filesystem.
//!
//! Every payload lands in `build/<tag>/initrd/bin/`. Steps are attempted
//! independently so one report names everything that is missing, but any
//! required failure aborts the build before script synthesis — a tree
//! with a payload missing must never reach the packager.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::{debug, info};

use crate::common::{copy_dir_recursive, ensure_dir_exists};
use crate::error::{BuildError, StagingFailures};
use crate::initrd::BuildContext;

/// Name the shell/utility binary takes inside the staging tree. The init
/// script invokes it by this name and the `sh` symlink points at it.
pub const BUSYBOX_NAME: &str = "busybox";

/// Wipe any previous tree for this tag and stage all payloads.
pub fn populate(ctx: &BuildContext) -> Result<(), BuildError> {
    let tag = ctx.request.tag.clone();
    let staging = ctx.staging_dir();
    let bin = ctx.bin_dir();

    let mut failures = StagingFailures::default();

    // A leftover tree from an earlier run of the same tag would leak
    // stale payloads into the new image.
    if let Err(e) = reset_staging_dir(&staging, &bin) {
        failures.push("staging directory", e);
        return Err(BuildError::Staging { tag, failures });
    }

    info!(tag = %tag, dir = %staging.display(), "staging payloads");

    if let Err(e) = copy_file(&ctx.config.busybox, &bin.join(BUSYBOX_NAME)) {
        failures.push("busybox", e);
    }
    if let Err(e) = copy_file(&ctx.config.container_init, &ctx.staged_container_init()) {
        failures.push("container-init", e);
    }
    if let Err(e) = link_sh(&bin) {
        failures.push("sh symlink", e);
    }
    if let Err(e) = copy_file(
        &ctx.config.vsock_bridge,
        &bin.join(&ctx.names().vsock_bridge),
    ) {
        failures.push("vsock bridge", e);
    }
    if let Err(e) = copy_file(&ctx.request.source, &ctx.staged_source()) {
        failures.push("source file", e);
    }
    if let Err(e) = copy_pgms(ctx, &bin) {
        failures.push("pgms", e);
    }
    if let Err(e) = copy_qemu_init(ctx, &bin) {
        failures.push("qemu_init.sh", e);
    }

    // Optional payload: absence of the input is fine, a supplied path
    // that fails to copy is not.
    if let (Some(src), Some(name)) = (
        ctx.request.attestation_agent.as_ref(),
        ctx.names().attestation_agent.as_ref(),
    ) {
        if let Err(e) = copy_file(src, &bin.join(name)) {
            failures.push("attestation agent", e);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(BuildError::Staging { tag, failures })
    }
}

fn reset_staging_dir(staging: &Path, bin: &Path) -> Result<()> {
    if staging.exists() {
        fs::remove_dir_all(staging)
            .with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    ensure_dir_exists(bin)
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .with_context(|| format!("Failed to copy {} -> {}", src.display(), dst.display()))?;
    debug!(src = %src.display(), dst = %dst.display(), "staged");
    Ok(())
}

/// The guest's default shell resolves through `bin/sh -> busybox`.
fn link_sh(bin: &Path) -> Result<()> {
    let link = bin.join("sh");
    std::os::unix::fs::symlink(BUSYBOX_NAME, &link)
        .with_context(|| format!("Failed to link {} -> {}", link.display(), BUSYBOX_NAME))
}

fn copy_pgms(ctx: &BuildContext, bin: &Path) -> Result<()> {
    let src = ctx.config.pgms_dir();
    copy_dir_recursive(&src, &bin.join("pgms"))
        .with_context(|| format!("Failed to copy component directory {}", src.display()))
}

fn copy_qemu_init(ctx: &BuildContext, bin: &Path) -> Result<()> {
    let dst = bin.join("qemu_init.sh");
    copy_file(&ctx.config.qemu_init(), &dst)?;
    fs::set_permissions(&dst, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", dst.display()))
}

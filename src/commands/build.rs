//! Build command - runs the initrd pipeline.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::initrd::{self, BuildContext, BuildRequest, Mode};
use crate::process::HostRunner;

/// CLI-shaped build arguments, before validation.
pub struct BuildArgs {
    pub tag: String,
    pub source: PathBuf,
    pub mode: String,
    pub work_path: Option<String>,
    pub attestation_agent: Option<PathBuf>,
}

/// Execute the build command.
pub fn cmd_build(args: BuildArgs, config: &Config) -> Result<()> {
    let mode = Mode::parse(&args.mode, args.work_path.as_deref())?;
    let request = BuildRequest::new(args.tag, args.source, mode, args.attestation_agent)?;
    let ctx = BuildContext::new(request, config.clone())?;

    let report = initrd::run(&ctx, &HostRunner)?;

    println!(
        "initrd created for tag '{}': {} ({} KB)",
        ctx.request.tag,
        report.image.display(),
        report.image_size / 1024
    );
    if let Some(parts) = report.rootfs_parts {
        println!("  rootfs staged as {parts} part(s)");
    }
    Ok(())
}

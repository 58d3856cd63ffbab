//! Initrd build pipeline.
//!
//! A build runs four stages in order, each depending on the previous:
//!
//! 1. [`stage`] populates `build/<tag>/initrd/bin/` with the guest
//!    payloads (busybox, container-init, vsock bridge, the user source
//!    file, auxiliary components).
//! 2. [`script`] renders the guest `/init` boot script for the requested
//!    mode and writes it to the staging tree.
//! 3. [`split`] (ROOTFS mode only) chunks the staged rootfs archive into
//!    bounded parts and points the container-init helper at its working
//!    directory.
//! 4. [`package`] serializes the staging tree into the compressed
//!    `initrd.img`.
//!
//! Nothing is retained between runs; re-running a tag rebuilds its tree
//! from scratch. Builds with different tags touch disjoint directories
//! and may run concurrently; two builds of the SAME tag must be
//! serialized by the caller.

pub mod context;
pub mod manifest;
pub mod package;
pub mod script;
pub mod split;
pub mod stage;

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::BuildError;
use crate::process::CommandRunner;

pub use context::BuildContext;
pub use manifest::BuildManifest;

/// Build variant. The work path only means something to the ROOTFS
/// branch (it becomes the container-init helper's working directory),
/// so it lives on that variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Boot into an interactive shell after launching one sensitive program.
    Code,
    /// Extract a full container root filesystem and hand off to its init.
    Rootfs { work_path: String },
}

impl Mode {
    /// Parse a mode name from the CLI.
    ///
    /// `rootfs` requires a work path; anything other than the two known
    /// names is a configuration error, and no build output is produced.
    pub fn parse(value: &str, work_path: Option<&str>) -> Result<Self, BuildError> {
        match value.to_ascii_lowercase().as_str() {
            "code" => Ok(Mode::Code),
            "rootfs" => match work_path {
                Some(work_path) if !work_path.is_empty() => Ok(Mode::Rootfs {
                    work_path: work_path.to_string(),
                }),
                _ => Err(BuildError::configuration(
                    "mode 'rootfs' requires --work-path",
                )),
            },
            other => Err(BuildError::configuration(format!(
                "unrecognized mode '{other}' (expected 'code' or 'rootfs')"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Code => "code",
            Mode::Rootfs { .. } => "rootfs",
        }
    }
}

/// Immutable input for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Identifies the build output directory under the build root.
    pub tag: String,
    /// CODE program or ROOTFS archive to embed.
    pub source: PathBuf,
    pub mode: Mode,
    /// Optional attestation agent to stage alongside the other payloads.
    pub attestation_agent: Option<PathBuf>,
}

impl BuildRequest {
    /// Validate the request. Tag checking is minimal path-safety: the tag
    /// names a directory under the build root and must not escape it.
    pub fn new(
        tag: impl Into<String>,
        source: impl Into<PathBuf>,
        mode: Mode,
        attestation_agent: Option<PathBuf>,
    ) -> Result<Self, BuildError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(BuildError::configuration("tag must not be empty"));
        }
        if tag == "." || tag == ".." || tag.chars().any(std::path::is_separator) {
            return Err(BuildError::configuration(format!(
                "tag '{tag}' is not a safe directory name"
            )));
        }

        Ok(Self {
            tag,
            source: source.into(),
            mode,
            attestation_agent,
        })
    }
}

/// What a successful build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub image: PathBuf,
    pub image_size: u64,
    /// Number of rootfs parts staged into the image (ROOTFS mode only).
    pub rootfs_parts: Option<usize>,
}

/// Run the whole pipeline for one request.
///
/// Fails fast: a staging, script, split, or packaging error aborts the
/// run before any later stage, so a partially staged tree can never be
/// packaged into a silently non-bootable image.
pub fn run(ctx: &BuildContext, runner: &dyn CommandRunner) -> Result<BuildReport, BuildError> {
    let tag = &ctx.request.tag;
    info!(tag = %tag, mode = ctx.request.mode.name(), "starting initrd build");

    stage::populate(ctx)?;

    let text = script::render(&ctx.request.mode, ctx.names());
    script::write(ctx, &text)?;

    let rootfs_parts = match &ctx.request.mode {
        Mode::Rootfs { work_path } => Some(split::split_staged_rootfs(ctx, work_path)?),
        Mode::Code => None,
    };

    package::package(ctx, runner)?;

    let image = ctx.image_path();
    let image_size = fs::metadata(&image)
        .map(|m| m.len())
        .map_err(|source| BuildError::Packaging {
            tag: tag.clone(),
            source: anyhow::Error::new(source)
                .context(format!("built image missing at {}", image.display())),
        })?;

    let report = BuildReport {
        image,
        image_size,
        rootfs_parts,
    };

    // The image is complete at this point; a manifest write failure is
    // worth a warning, not a failed build.
    if let Err(e) = BuildManifest::for_build(ctx, &report).write(&ctx.build_dir()) {
        warn!(tag = %tag, error = %format!("{e:#}"), "failed to write build manifest");
    }

    info!(tag = %tag, image = %report.image.display(), size = report.image_size, "initrd build complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_mode() {
        assert_eq!(Mode::parse("code", None).unwrap(), Mode::Code);
        // Work path is ignored outside the rootfs branch.
        assert_eq!(Mode::parse("CODE", Some("/app")).unwrap(), Mode::Code);
    }

    #[test]
    fn test_parse_rootfs_mode_carries_work_path() {
        let mode = Mode::parse("rootfs", Some("/app")).unwrap();
        assert_eq!(
            mode,
            Mode::Rootfs {
                work_path: "/app".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rootfs_without_work_path_is_rejected() {
        let err = Mode::parse("rootfs", None).unwrap_err();
        assert!(err.to_string().contains("--work-path"));
    }

    #[test]
    fn test_parse_unrecognized_mode_is_configuration_error() {
        let err = Mode::parse("initrd", None).unwrap_err();
        assert!(matches!(err, BuildError::Configuration { .. }));
        assert!(err.to_string().contains("initrd"));
    }

    #[test]
    fn test_request_rejects_unsafe_tags() {
        for tag in ["", ".", "..", "a/b"] {
            let result = BuildRequest::new(tag, "/tmp/agent.bin", Mode::Code, None);
            assert!(result.is_err(), "tag '{tag}' should be rejected");
        }
    }

    #[test]
    fn test_request_accepts_plain_tags() {
        assert!(BuildRequest::new("t1", "/tmp/agent.bin", Mode::Code, None).is_ok());
        assert!(BuildRequest::new("release-2.1_x86", "/tmp/a", Mode::Code, None).is_ok());
    }
}

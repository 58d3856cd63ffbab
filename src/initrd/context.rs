//! Build context shared across all pipeline stages.

use std::path::PathBuf;

use crate::common::base_name;
use crate::config::Config;
use crate::error::BuildError;
use crate::initrd::BuildRequest;

/// Base names the payloads take inside the staged `bin/` directory.
///
/// The busybox binary is always staged as `busybox` so the init script's
/// `busybox` invocations and the `sh` symlink resolve; everything else
/// keeps the base name of its configured source path.
#[derive(Debug, Clone)]
pub struct StagedNames {
    pub source: String,
    pub vsock_bridge: String,
    pub container_init: String,
    pub attestation_agent: Option<String>,
}

/// Shared context for one build: the request, the resolved configuration,
/// and the derived paths every stage works with.
pub struct BuildContext {
    pub request: BuildRequest,
    pub config: Config,
    names: StagedNames,
}

impl BuildContext {
    /// Create a context, resolving the staged base names up front.
    ///
    /// A configured payload path without a base name is a configuration
    /// error: the staging step could never name its destination.
    pub fn new(request: BuildRequest, config: Config) -> Result<Self, BuildError> {
        let resolve = |path: &PathBuf| -> Result<String, BuildError> {
            base_name(path).map_err(|e| BuildError::configuration(format!("{e:#}")))
        };

        let names = StagedNames {
            source: resolve(&request.source)?,
            vsock_bridge: resolve(&config.vsock_bridge)?,
            container_init: resolve(&config.container_init)?,
            attestation_agent: request
                .attestation_agent
                .as_ref()
                .map(|p| resolve(p))
                .transpose()?,
        };

        Ok(Self {
            request,
            config,
            names,
        })
    }

    pub fn names(&self) -> &StagedNames {
        &self.names
    }

    /// `<build_root>/<tag>`
    pub fn build_dir(&self) -> PathBuf {
        self.config.build_root.join(&self.request.tag)
    }

    /// `<build_root>/<tag>/initrd` — the staging tree root.
    pub fn staging_dir(&self) -> PathBuf {
        self.build_dir().join("initrd")
    }

    /// `<build_root>/<tag>/initrd/bin` — the payload directory.
    pub fn bin_dir(&self) -> PathBuf {
        self.staging_dir().join("bin")
    }

    /// The generated boot script inside the staging tree.
    pub fn init_path(&self) -> PathBuf {
        self.staging_dir().join("init")
    }

    /// The final compressed image.
    pub fn image_path(&self) -> PathBuf {
        self.build_dir().join("initrd.img")
    }

    /// Where the user source file lands during staging.
    pub fn staged_source(&self) -> PathBuf {
        self.bin_dir().join(&self.names.source)
    }

    /// Where the container-init helper lands during staging.
    pub fn staged_container_init(&self) -> PathBuf {
        self.bin_dir().join(&self.names.container_init)
    }
}

//! Pipeline error taxonomy.
//!
//! Each variant carries the build tag and the underlying cause, so a
//! failed build can be diagnosed from the error alone. The pipeline
//! aborts on the first fatal stage error instead of logging and
//! reporting overall success.

use std::fmt;
use thiserror::Error;

/// A single staging step that did not complete.
#[derive(Debug)]
pub struct StagingFailure {
    /// Which payload the step was staging (e.g. "busybox", "pgms").
    pub step: &'static str,
    /// The underlying I/O failure.
    pub error: anyhow::Error,
}

/// All staging steps that failed for one build, in execution order.
#[derive(Debug, Default)]
pub struct StagingFailures(pub Vec<StagingFailure>);

impl StagingFailures {
    pub fn push(&mut self, step: &'static str, error: anyhow::Error) {
        self.0.push(StagingFailure { step, error });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for StagingFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for failure in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {:#}", failure.step, failure.error)?;
            first = false;
        }
        Ok(())
    }
}

/// Fatal pipeline errors, mirroring the stages that can produce them.
#[derive(Debug, Error)]
pub enum BuildError {
    /// One or more required staging steps did not complete.
    #[error("staging failed for build '{tag}': {failures}")]
    Staging {
        tag: String,
        failures: StagingFailures,
    },

    /// The build request itself is malformed (unrecognized mode, unsafe tag).
    #[error("invalid build configuration: {message}")]
    Configuration { message: String },

    /// Chunking the rootfs payload failed.
    #[error("splitting rootfs payload failed for build '{tag}'")]
    Split {
        tag: String,
        #[source]
        source: anyhow::Error,
    },

    /// Archival or compression of the staging tree failed.
    #[error("packaging initrd image failed for build '{tag}'")]
    Packaging {
        tag: String,
        #[source]
        source: anyhow::Error,
    },

    /// The init script could not be written.
    #[error("writing init script failed for build '{tag}'")]
    Script {
        tag: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BuildError::Configuration {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_staging_error_lists_every_failed_step() {
        let mut failures = StagingFailures::default();
        failures.push("busybox", anyhow!("no such file"));
        failures.push("vsock_bridge", anyhow!("permission denied"));

        let err = BuildError::Staging {
            tag: "t1".to_string(),
            failures,
        };
        let msg = err.to_string();
        assert!(msg.contains("t1"));
        assert!(msg.contains("busybox: no such file"));
        assert!(msg.contains("vsock_bridge: permission denied"));
    }

    #[test]
    fn test_configuration_error_carries_message() {
        let err = BuildError::configuration("unrecognized mode 'initrd'");
        assert!(err.to_string().contains("unrecognized mode 'initrd'"));
    }
}

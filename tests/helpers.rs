//! Shared test utilities for initrdgen tests.

use std::cell::RefCell;
use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::Result;
use tempfile::TempDir;

use initrdgen::config::Config;
use initrdgen::initrd::{BuildContext, BuildRequest, Mode};
use initrdgen::process::{CommandResult, CommandRunner};

/// Test environment: a temp base dir with a complete mock component tree.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub base_dir: PathBuf,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().to_path_buf();

        let components = base_dir.join("components");
        fs::create_dir_all(components.join("default/pgms")).expect("Failed to create components");
        fs::write(components.join("busybox"), b"\x7fELF-busybox").unwrap();
        fs::write(
            components.join("container_init"),
            "#!/bin/sh\nexec /sbin/docker-entrypoint\n",
        )
        .unwrap();
        fs::write(components.join("vsock_bridge"), b"\x7fELF-bridge").unwrap();
        fs::write(components.join("default/pgms/report.sh"), "#!/bin/sh\n").unwrap();
        fs::write(components.join("default/qemu_init.sh"), "#!/bin/sh\n").unwrap();

        let config = Config {
            busybox: components.join("busybox"),
            container_init: components.join("container_init"),
            vsock_bridge: components.join("vsock_bridge"),
            component_dir: components.join("default"),
            build_root: base_dir.join("build"),
        };

        Self {
            _temp_dir: temp_dir,
            base_dir,
            config,
        }
    }

    /// Write a source payload of `len` patterned bytes and return its path.
    pub fn write_source(&self, name: &str, len: usize) -> PathBuf {
        let path = self.base_dir.join(name);
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs::write(&path, data).unwrap();
        path
    }

    pub fn context(
        &self,
        tag: &str,
        source: &Path,
        mode: Mode,
        attestation_agent: Option<PathBuf>,
    ) -> BuildContext {
        let request = BuildRequest::new(tag, source, mode, attestation_agent)
            .expect("request should validate");
        BuildContext::new(request, self.config.clone()).expect("context should resolve")
    }
}

/// One invocation a [`FakeRunner`] saw.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
}

/// Command-runner double: records every call and simulates the archival
/// pipeline by writing a placeholder image to the shell redirect target.
pub struct FakeRunner {
    pub calls: RefCell<Vec<RecordedCall>>,
    /// Exit code to report (0 = success).
    pub exit_code: i32,
    pub stderr: String,
}

impl FakeRunner {
    pub fn succeeding() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            exit_code: 0,
            stderr: String::new(),
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            exit_code: 1,
            stderr: stderr.to_string(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult> {
        self.calls.borrow_mut().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            dir: dir.map(Path::to_path_buf),
        });

        if self.exit_code == 0 {
            // Honor the `> '<path>'` redirect the packager builds, so the
            // atomic rename downstream has something to move.
            if let Some(target) = args.iter().find_map(|a| redirect_target(a)) {
                fs::write(target, b"\x1f\x8b-fake-image").unwrap();
            }
        }

        Ok(CommandResult {
            status: ExitStatus::from_raw(self.exit_code << 8),
            stdout: String::new(),
            stderr: self.stderr.clone(),
        })
    }
}

fn redirect_target(arg: &str) -> Option<PathBuf> {
    let (_, tail) = arg.split_once("> '")?;
    let (path, _) = tail.split_once('\'')?;
    Some(PathBuf::from(path))
}

pub fn assert_file_exists(path: &Path) {
    assert!(path.is_file(), "expected file at {}", path.display());
}

pub fn assert_dir_exists(path: &Path) {
    assert!(path.is_dir(), "expected directory at {}", path.display());
}

pub fn assert_symlink(path: &Path, target: &str) {
    let meta = fs::symlink_metadata(path)
        .unwrap_or_else(|_| panic!("expected symlink at {}", path.display()));
    assert!(meta.file_type().is_symlink(), "{} is not a symlink", path.display());
    assert_eq!(
        fs::read_link(path).unwrap(),
        PathBuf::from(target),
        "wrong symlink target for {}",
        path.display()
    );
}

/// Relative paths of every entry under `root`, sorted, for membership
/// comparisons.
pub fn tree_membership(root: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    entries.sort();
    entries
}

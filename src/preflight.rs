//! Preflight checks for the initrd builder.
//!
//! Validates host tools and configured component payloads before a
//! build. Run with `initrdgen preflight` to check everything is ready.

use std::path::Path;

use crate::config::Config;

/// Host tools the packaging stage invokes.
const HOST_TOOLS: &[&str] = &["sh", "find", "cpio", "gzip"];

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - a build will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    fn pass_with(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details),
        }
    }

    fn fail(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details),
        }
    }

    fn warn(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    pub fn passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn print(&self) {
        for check in &self.checks {
            let marker = match check.status {
                CheckStatus::Pass => "ok",
                CheckStatus::Warn => "warn",
                CheckStatus::Fail => "FAIL",
            };
            match &check.details {
                Some(details) => println!("  [{marker}] {} - {}", check.name, details),
                None => println!("  [{marker}] {}", check.name),
            }
        }
    }
}

/// Check host tools and configured payloads.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    for tool in HOST_TOOLS {
        checks.push(check_tool(tool));
    }

    checks.push(check_payload("busybox", &config.busybox));
    checks.push(check_payload("container-init", &config.container_init));
    checks.push(check_payload("vsock bridge", &config.vsock_bridge));
    checks.push(check_payload("qemu_init.sh", &config.qemu_init()));

    // pgms/ can legitimately be empty, but it has to exist to stage.
    let pgms = config.pgms_dir();
    if pgms.is_dir() {
        checks.push(CheckResult::pass_with("pgms", pgms.display().to_string()));
    } else {
        checks.push(CheckResult::fail(
            "pgms",
            format!("not a directory: {}", pgms.display()),
        ));
    }

    PreflightReport { checks }
}

fn check_tool(tool: &str) -> CheckResult {
    match which::which(tool) {
        Ok(path) => CheckResult::pass_with(tool, path.display().to_string()),
        Err(_) => CheckResult::fail(tool, "not found in PATH".to_string()),
    }
}

fn check_payload(name: &str, path: &Path) -> CheckResult {
    if !path.is_file() {
        return CheckResult::fail(name, format!("not found: {}", path.display()));
    }
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => {
            CheckResult::warn(name, format!("empty file: {}", path.display()))
        }
        _ => CheckResult::pass_with(name, path.display().to_string()),
    }
}

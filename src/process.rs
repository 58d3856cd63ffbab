//! Command execution with captured output and consistent error handling.
//!
//! The pipeline never shells out directly: it goes through the narrow
//! [`CommandRunner`] capability so tests can substitute doubles that
//! simulate archival-tool success or failure without touching real tools.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, or -1 if terminated by signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Builder for configuring command execution.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    /// If true, don't fail on non-zero exit.
    allow_fail: bool,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            current_dir: None,
            allow_fail: false,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Set the working directory.
    pub fn dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// Allow non-zero exit codes without failing.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Run the command and capture output.
    pub fn run(self) -> Result<CommandResult> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            let stderr = result.stderr_trimmed();
            if stderr.is_empty() {
                bail!("'{}' failed (exit code {})", self.program, result.code());
            } else {
                bail!(
                    "'{}' failed (exit code {}):\n{}",
                    self.program,
                    result.code(),
                    stderr
                );
            }
        }

        Ok(result)
    }
}

/// Capability for running external commands.
///
/// Deliberately narrow: program, arguments, working directory. A spawn
/// failure is an `Err`; a tool that ran and exited non-zero is reported
/// through the returned [`CommandResult`] so callers decide what is fatal.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult>;
}

/// Runner that executes commands on the host.
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult> {
        let mut cmd = Cmd::new(program).args(args).allow_fail();
        if let Some(dir) = dir {
            cmd = cmd.dir(dir);
        }
        cmd.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_success() {
        let result = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn test_run_failure_includes_stderr() {
        let err = Cmd::new("ls")
            .arg("/nonexistent_path_12345")
            .run()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No such file") || msg.contains("cannot access"));
    }

    #[test]
    fn test_allow_fail() {
        let result = Cmd::new("false").allow_fail().run().unwrap();
        assert!(!result.success());
        assert_eq!(result.code(), 1);
    }

    #[test]
    fn test_host_runner_reports_nonzero_in_result() {
        let result = HostRunner
            .run("sh", &["-c".to_string(), "exit 3".to_string()], None)
            .unwrap();
        assert!(!result.success());
        assert_eq!(result.code(), 3);
    }

    #[test]
    fn test_host_runner_respects_working_dir() {
        let result = HostRunner.run("pwd", &[], Some(Path::new("/tmp"))).unwrap();
        assert!(result.stdout.trim().ends_with("tmp"));
    }

    #[test]
    fn test_host_runner_spawn_failure_is_error() {
        assert!(HostRunner
            .run("nonexistent_program_12345", &[], None)
            .is_err());
    }
}

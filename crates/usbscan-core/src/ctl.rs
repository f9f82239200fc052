/// Synchronous invocation of the agent's `SentinelCtl.exe` command line.
///
/// Each call blocks until the child exits; there is no timeout. Only the
/// exit code and standard output are captured. A non-zero exit is an error,
/// whatever the tool printed.
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Exit status and captured standard output of one child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was terminated without an exit code.
    pub code: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs an external program to completion.
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs programs as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.to_path_buf(),
                args: args.join(" "),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// The scanner command line at a resolved path.
#[derive(Debug, Clone)]
pub struct SentinelCtl<R> {
    path: PathBuf,
    runner: R,
    in_progress_prefix: String,
}

impl<R: CommandRunner> SentinelCtl<R> {
    pub fn new(path: PathBuf, runner: R, in_progress_prefix: impl Into<String>) -> Self {
        Self {
            path,
            runner,
            in_progress_prefix: in_progress_prefix.into(),
        }
    }

    /// `is_scan_in_progress`: true when the reply starts with the
    /// in-progress literal. Anything else, including an empty reply, means
    /// idle.
    pub fn is_scan_in_progress(&self) -> Result<bool> {
        let stdout = self.checked(&["is_scan_in_progress"])?;
        Ok(stdout.starts_with(&self.in_progress_prefix))
    }

    /// `abort_scan`: returns the raw reply. The reply is not interpreted.
    pub fn abort_scan(&self) -> Result<String> {
        self.checked(&["abort_scan"])
    }

    /// `scan_folder -i <root>`: returns the raw reply.
    pub fn scan_folder(&self, root: &str) -> Result<String> {
        self.checked(&["scan_folder", "-i", root])
    }

    fn checked(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run(&self.path, args)?;
        if !output.success() {
            return Err(Error::CommandFailed {
                program: self.path.clone(),
                args: args.join(" "),
                code: output.code,
                stdout: output.stdout,
            });
        }
        Ok(output.stdout)
    }
}

//! Blocking subprocess helpers
//!
//! Every external collaborator (package manager, git, npm, pm2) is invoked
//! through here. Calls block until the child exits; the exit code is the sole
//! success signal. No timeouts, no streaming.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct CmdOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    /// Diagnostic message for a failed command: stderr if the tool produced
    /// any, otherwise the exit code.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Run a program with arguments, optionally in a working directory, and wait
/// for it to exit. Output is captured, not streamed.
pub fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> io::Result<CmdOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null());

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output()?;

    Ok(CmdOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a shell command line via `sh -c`. Used for the vendor runtime setup
/// sequence, which ships as a piped script.
pub fn run_shell(script: &str, cwd: Option<&Path>) -> io::Result<CmdOutput> {
    run("sh", &["-c", script], cwd)
}

/// Check whether a command is usable by probing it with `--version`.
///
/// All the tools this pipeline depends on (git, curl, node, npm, pm2)
/// answer `--version` with exit code 0.
pub fn command_exists(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

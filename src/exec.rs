//! Shell-execution capability for post-apply commands.
//!
//! Commands are opaque shell-style strings, so they run under `sh -c` with
//! the working tree as the current directory. There is no timeout here; the
//! enclosing CI step owns wall-clock limits.

use std::path::Path;
use std::process::Command;

/// Captured outcome of one command. stdout/stderr are kept in full; only
/// log previews are truncated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a shell command string with `dir` as the working directory.
///
/// Spawn failures fold into the result (exit code 1, message on stderr) so
/// one bad command never aborts the surrounding run.
pub fn run_shell(command: &str, dir: &Path) -> CommandResult {
    match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
    {
        Ok(output) => CommandResult {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // None means killed by signal; fold into a generic failure code.
            exit_code: output.status.code().unwrap_or(-1),
        },
        Err(err) => CommandResult {
            command: command.to_string(),
            stdout: String::new(),
            stderr: err.to_string(),
            exit_code: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = run_shell("echo done", dir.path());
        assert_eq!(result.stdout, "done\n");
        assert_eq!(result.exit_code, 0);
        assert!(result.success());
    }

    #[test]
    fn nonzero_exit_is_recorded_not_raised() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = run_shell("exit 3", dir.path());
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[test]
    fn commands_run_in_the_given_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = run_shell("echo marker > here.txt", dir.path());
        assert!(result.success());
        let written = std::fs::read_to_string(dir.path().join("here.txt")).expect("read marker");
        assert_eq!(written, "marker\n");
    }
}

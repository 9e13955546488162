//! The command runner: sequential execution of chosen commands under a
//! shared deadline.
//!
//! Grounded on `original_source/cli/wat/wat.go` (`runCmd`/`runCmds`/
//! `RunCommands`) and the teacher's `utils::process` shell-exec pattern.

use crate::error::{Result, WatError};
use crate::types::{Command, CommandLog};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

/// Visual divider written before and after each command's output, matching
/// the original's `Divider` constant.
pub const DIVIDER: &str = "--------------------\n";

/// Runs `commands` sequentially in `root` under one shared deadline of
/// `now + timeout`. Non-zero exits are not errors — they produce a
/// `CommandLog{success: false}` and the loop continues. A spawn/IO error,
/// or deadline expiry, aborts the whole sequence and returns no partial
/// log, matching the "abort with that error" contract in the spec.
pub fn run_commands(
    root: &Path,
    commands: &[Command],
    timeout: Duration,
    stdout: &mut dyn Write,
) -> Result<Vec<CommandLog>> {
    let deadline = Instant::now() + timeout;
    let mut logs = Vec::with_capacity(commands.len());
    for cmd in commands {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(WatError::CancelledOrTimedOut);
        }
        writeln!(stdout, "{DIVIDER}{}", cmd.command).ok();
        let log = run_one(root, cmd, remaining)?;
        writeln!(stdout, "{DIVIDER}").ok();
        logs.push(log);
    }
    Ok(logs)
}

fn run_one(root: &Path, cmd: &Command, remaining: Duration) -> Result<CommandLog> {
    let start = Instant::now();
    let mut child = platform_shell_exec(&cmd.command, root)?;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(CommandLog {
                command: cmd.command.clone(),
                success: status.success(),
                duration: start.elapsed(),
            });
        }
        if start.elapsed() >= remaining {
            let _ = child.kill();
            let _ = child.wait();
            return Err(WatError::CancelledOrTimedOut);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

#[cfg(unix)]
fn platform_shell_exec(command: &str, root: &Path) -> Result<std::process::Child> {
    Ok(std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .stdin(Stdio::null())
        .spawn()?)
}

#[cfg(windows)]
fn platform_shell_exec(command: &str, root: &Path) -> Result<std::process::Child> {
    Ok(std::process::Command::new("cmd")
        .arg("/C")
        .arg(command)
        .current_dir(root)
        .stdin(Stdio::null())
        .spawn()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nonzero_exit_is_recorded_not_errored() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let cmds = vec![Command::new("exit 3", "*")];
        let logs = run_commands(dir.path(), &cmds, Duration::from_secs(5), &mut out).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].success);
    }

    #[test]
    fn zero_exit_is_success() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let cmds = vec![Command::new("true", "*")];
        let logs = run_commands(dir.path(), &cmds, Duration::from_secs(5), &mut out).unwrap();
        assert!(logs[0].success);
    }

    #[test]
    fn deadline_expiry_is_cancellation() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let cmds = vec![Command::new("sleep 5", "*")];
        let result = run_commands(dir.path(), &cmds, Duration::from_millis(50), &mut out);
        assert!(matches!(result, Err(WatError::CancelledOrTimedOut)));
    }

    #[test]
    fn divider_brackets_each_command() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let cmds = vec![Command::new("true", "*")];
        run_commands(dir.path(), &cmds, Duration::from_secs(5), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(DIVIDER.trim_end()).count(), 2);
    }
}

//! The plugin host: builtin and user-defined candidate-command producers.
//!
//! Grounded on `original_source/cli/wat/plugins.go`. Plugins share one
//! interface; the host iterates them in registration order, accumulates
//! results, and never fails the round on a single plugin's error — the
//! error is logged to the diagnostics sink and that plugin's output is
//! skipped.

mod go_plugin;
mod nodejs_plugin;
mod user_plugin;

pub use go_plugin::GoPlugin;
pub use nodejs_plugin::NodeJsPlugin;
pub use user_plugin::UserPlugin;

use crate::types::Command;
use crate::workspace::{FNAME_USER_PLUGINS, Workspace};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Command as Process, Output, Stdio};
use std::time::{Duration, Instant};

/// A candidate-command producer. `run` is given the workspace root and a
/// deadline; it returns the commands it can offer.
pub trait Plugin {
    fn name(&self) -> &str;
    fn run(&self, root: &Path, deadline: Instant) -> anyhow::Result<Vec<Command>>;
}

/// Marks a plugin error as deadline expiry rather than an ordinary failure,
/// so `run_all` can propagate it as a cancellation (spec.md §4.C) instead of
/// logging it as a `plugin_error`.
#[derive(Debug)]
pub struct DeadlineExceeded;

impl std::fmt::Display for DeadlineExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline exceeded")
    }
}

impl std::error::Error for DeadlineExceeded {}

/// Spawns `command` with piped stdout/stderr and polls it against
/// `deadline` the same way `runner.rs`'s `run_one` watches a chosen
/// command: a `try_wait()` poll loop, killing the child and returning
/// [`DeadlineExceeded`] on expiry instead of blocking forever in
/// `Command::output()`. Output is drained on background threads while
/// polling so a chatty child can't deadlock on a full pipe buffer.
pub fn spawn_with_deadline(mut command: Process, deadline: Instant) -> anyhow::Result<Output> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdout_pipe = child.stdout.take().expect("stdout piped above");
    let mut stderr_pipe = child.stderr.take().expect("stderr piped above");
    let stdout_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf);
        buf
    });
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf);
        buf
    });

    loop {
        if let Some(status) = child.try_wait()? {
            let stdout = stdout_reader.join().unwrap_or_default();
            let stderr = stderr_reader.join().unwrap_or_default();
            return Ok(Output { status, stdout, stderr });
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            anyhow::bail!(DeadlineExceeded);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// The fixed set of builtin plugins, in registration order.
pub fn builtins() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(GoPlugin), Box::new(NodeJsPlugin)]
}

/// User plugins declared in `.wat/user_plugins`, one shell command per line.
pub fn user_plugins(ws: &Workspace) -> Vec<UserPlugin> {
    if !ws.exists(FNAME_USER_PLUGINS) {
        return Vec::new();
    }
    let Ok(text) = ws.read_to_string(FNAME_USER_PLUGINS) else {
        return Vec::new();
    };
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| UserPlugin::new(l.to_string()))
        .collect()
}

/// Runs every plugin in `plugins`, accumulating `Command`s and logging (not
/// propagating) any individual plugin error. Commands are deduped by their
/// `command` string (§3: identity is the command string), keeping the first
/// plugin's `file_pattern` for a given command on a later collision.
pub fn run_all(
    plugins: &[Box<dyn Plugin>],
    root: &Path,
    deadline: Instant,
) -> Vec<Command> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for plugin in plugins {
        if Instant::now() >= deadline {
            crate::diagnostics::log_event("plugin_host", "deadline exceeded, stopping");
            break;
        }
        match plugin.run(root, deadline) {
            Ok(cmds) => {
                for cmd in cmds {
                    if seen.insert(cmd.command.clone()) {
                        out.push(cmd);
                    }
                }
            }
            Err(e) if e.downcast_ref::<DeadlineExceeded>().is_some() => {
                crate::diagnostics::log_event(
                    "plugin_host",
                    &format!("{}: deadline exceeded, stopping", plugin.name()),
                );
                break;
            }
            Err(e) => crate::diagnostics::log_event(
                "plugin_error",
                &format!("{}: {e:#}", plugin.name()),
            ),
        }
    }
    out
}

/// Runs a homogeneous list of user plugins the same way `run_all` runs
/// builtins.
pub fn run_all_user(plugins: &[UserPlugin], root: &Path, deadline: Instant) -> Vec<Command> {
    let boxed: Vec<Box<dyn Plugin>> = plugins
        .iter()
        .map(|p| Box::new(p.clone()) as Box<dyn Plugin>)
        .collect();
    run_all(&boxed, root, deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Failing;
    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn run(&self, _root: &Path, _deadline: Instant) -> anyhow::Result<Vec<Command>> {
            anyhow::bail!("boom")
        }
    }

    struct Working;
    impl Plugin for Working {
        fn name(&self) -> &str {
            "working"
        }
        fn run(&self, _root: &Path, _deadline: Instant) -> anyhow::Result<Vec<Command>> {
            Ok(vec![Command::new("cargo test", "**/*.rs")])
        }
    }

    #[test]
    fn one_failing_plugin_does_not_abort_the_round() {
        let dir = tempdir().unwrap();
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Failing), Box::new(Working)];
        let cmds = run_all(&plugins, dir.path(), Instant::now() + std::time::Duration::from_secs(5));
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].command, "cargo test");
    }

    #[test]
    fn duplicate_commands_across_plugins_are_deduped() {
        let dir = tempdir().unwrap();
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Working), Box::new(Working)];
        let cmds = run_all(&plugins, dir.path(), Instant::now() + std::time::Duration::from_secs(5));
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn spawn_with_deadline_kills_a_hanging_child() {
        let mut cmd = Process::new("sh");
        cmd.arg("-c").arg("sleep 5");
        let deadline = Instant::now() + Duration::from_millis(50);
        let err = spawn_with_deadline(cmd, deadline).unwrap_err();
        assert!(err.downcast_ref::<DeadlineExceeded>().is_some());
    }

    #[test]
    fn spawn_with_deadline_captures_stdout() {
        let mut cmd = Process::new("sh");
        cmd.arg("-c").arg("echo hello");
        let deadline = Instant::now() + Duration::from_secs(5);
        let output = spawn_with_deadline(cmd, deadline).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn user_plugins_parsed_one_per_line() {
        let dir = tempdir().unwrap();
        let ws = crate::workspace::init(dir.path()).unwrap();
        ws.write(FNAME_USER_PLUGINS, b"echo '[]'\n\nscripts/list-tests.sh\n")
            .unwrap();
        let plugins = user_plugins(&ws);
        assert_eq!(plugins.len(), 2);
    }
}

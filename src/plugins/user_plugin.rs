//! A user-declared plugin: a shell command whose stdout is decoded as a
//! JSON array of `Command`s. Grounded on
//! `original_source/cli/wat/plugins.go`'s `userPlugin`.

use super::Plugin;
use crate::types::Command;
use std::path::Path;
use std::process::Command as Process;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct UserPlugin {
    shell_command: String,
}

impl UserPlugin {
    pub fn new(shell_command: String) -> Self {
        UserPlugin { shell_command }
    }
}

impl Plugin for UserPlugin {
    fn name(&self) -> &str {
        &self.shell_command
    }

    fn run(&self, root: &Path, deadline: Instant) -> anyhow::Result<Vec<Command>> {
        let mut cmd = Process::new("sh");
        cmd.arg("-c").arg(&self.shell_command).current_dir(root);
        let output = super::spawn_with_deadline(cmd, deadline)?;
        if !output.status.success() {
            anyhow::bail!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let commands: Vec<Command> = serde_json::from_slice(&output.stdout)?;
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_json_array_from_stdout() {
        let plugin = UserPlugin::new(
            r#"echo '[{"command":"cargo test","file_pattern":"**/*.rs"}]'"#.to_string(),
        );
        let cmds = plugin
            .run(Path::new("."), Instant::now() + std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(cmds, vec![Command::new("cargo test", "**/*.rs")]);
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let plugin = UserPlugin::new("exit 1".to_string());
        assert!(
            plugin
                .run(Path::new("."), Instant::now() + std::time::Duration::from_secs(5))
                .is_err()
        );
    }
}

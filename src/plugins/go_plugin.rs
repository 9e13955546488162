//! Builtin plugin enumerating Go packages with tests via `go list -json`.
//! Grounded on `original_source/cli/wat/plugin_go.go`.

use super::Plugin;
use crate::types::Command;
use serde::Deserialize;
use std::path::Path;
use std::process::Command as Process;
use std::time::Instant;

pub struct GoPlugin;

#[derive(Debug, Deserialize)]
struct GoListEntry {
    #[serde(rename = "Dir")]
    dir: String,
    #[serde(rename = "ImportPath")]
    import_path: String,
    #[serde(rename = "TestGoFiles", default)]
    test_go_files: Vec<String>,
}

impl GoListEntry {
    fn to_command(&self, root: &Path) -> Option<Command> {
        if self.test_go_files.is_empty() {
            return None;
        }
        let dir = Path::new(&self.dir);
        let rel = dir.strip_prefix(root).ok()?;
        Some(Command::new(
            format!("go test {}", self.import_path),
            format!("{}/*", rel.display()),
        ))
    }
}

impl Plugin for GoPlugin {
    fn name(&self) -> &str {
        "go"
    }

    fn run(&self, root: &Path, deadline: Instant) -> anyhow::Result<Vec<Command>> {
        let mut cmd = Process::new("go");
        cmd.args(["list", "-json", "./..."]).current_dir(root);
        let output = super::spawn_with_deadline(cmd, deadline)?;
        if !output.status.success() {
            anyhow::bail!("go list failed: {}", String::from_utf8_lossy(&output.stderr));
        }
        let entries = parse_json_stream(&output.stdout)?;
        Ok(entries
            .iter()
            .filter_map(|e| e.to_command(root))
            .collect())
    }
}

/// `go list -json` emits one concatenated JSON object per package, not a
/// JSON array; decode them as a stream.
fn parse_json_stream(bytes: &[u8]) -> anyhow::Result<Vec<GoListEntry>> {
    let de = serde_json::Deserializer::from_slice(bytes);
    let mut stream = de.into_iter::<GoListEntry>();
    let mut out = Vec::new();
    for entry in &mut stream {
        out.push(entry?);
    }
    Ok(out)
}

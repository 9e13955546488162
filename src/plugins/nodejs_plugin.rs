//! Builtin plugin reading `package.json` test scripts.
//! Grounded on `original_source/cli/wat/plugin_nodejs.go`.

use super::Plugin;
use crate::types::Command;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

pub struct NodeJsPlugin;

/// Well-known test-runner invocations recognized even when the script is
/// not literally named `test`.
const COMMON_NODE_TEST_SCRIPTS: &[&str] = &[
    "jest",
    "mocha",
    "mocha --require babel-register",
    "eslint .",
    "jasmine",
];

#[derive(Debug, Deserialize, Default)]
struct PackageJson {
    #[serde(default)]
    scripts: HashMap<String, String>,
}

impl Plugin for NodeJsPlugin {
    fn name(&self) -> &str {
        "nodejs"
    }

    fn run(&self, root: &Path, deadline: Instant) -> anyhow::Result<Vec<Command>> {
        if Instant::now() >= deadline {
            anyhow::bail!(super::DeadlineExceeded);
        }
        let path = root.join("package.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&path)?;
        let pkg: PackageJson = serde_json::from_str(&text)?;

        let mut names: Vec<&String> = pkg
            .scripts
            .iter()
            .filter(|(name, script)| {
                name.as_str() == "test"
                    || COMMON_NODE_TEST_SCRIPTS.iter().any(|known| *known == script.as_str())
            })
            .map(|(name, _)| name)
            .collect();
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| {
                let script = &pkg.scripts[name];
                Command::new(
                    format!("PATH=\"node_modules/.bin:$PATH\" {script}"),
                    "**/*.js",
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_package_json_yields_no_commands() {
        let dir = tempdir().unwrap();
        let cmds = NodeJsPlugin
            .run(dir.path(), Instant::now() + std::time::Duration::from_secs(5))
            .unwrap();
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_script_is_picked_up() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"scripts": {"test": "jest --ci"}}"#,
        )
        .unwrap();
        let cmds = NodeJsPlugin
            .run(dir.path(), Instant::now() + std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].command.contains("jest --ci"));
        assert_eq!(cmds[0].file_pattern, "**/*.js");
    }

    #[test]
    fn multiple_recognized_scripts_each_yield_a_command() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"scripts": {"test": "jest", "lint": "eslint ."}}"#,
        )
        .unwrap();
        let cmds = NodeJsPlugin
            .run(dir.path(), Instant::now() + std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn whitelisted_non_test_script_name_is_recognized() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"scripts": {"lint": "eslint ."}}"#,
        )
        .unwrap();
        let cmds = NodeJsPlugin
            .run(dir.path(), Instant::now() + std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(cmds.len(), 1);
    }
}

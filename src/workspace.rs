//! Workspace discovery and the `.wat/` marker directory.
//!
//! Grounded on `original_source/cli/wat/fs.go` and `init.go`: a workspace is
//! any ancestor directory containing a `.wat/` subdirectory. Files inside it
//! are named by fixed constants and accessed relative to the workspace root.

use crate::error::{Result, WatError};
use std::fs;
use std::path::{Path, PathBuf};

pub const WAT_DIR: &str = ".wat";
pub const FNAME_CMDLOG: &str = "cmdlog";
pub const FNAME_LIST: &str = "list";
pub const FNAME_USER_PLUGINS: &str = "user_plugins";
pub const FNAME_GITIGNORE: &str = ".gitignore";
pub const FNAME_WATIGNORE: &str = ".watignore";

/// A located `.wat` workspace: a root directory known to contain `.wat/`.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    /// Path to `.wat/<name>` under this workspace.
    pub fn wat_path(&self, name: &str) -> PathBuf {
        self.root.join(WAT_DIR).join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.wat_path(name).exists()
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.wat_path(name))?)
    }

    pub fn read_to_string(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.wat_path(name))?)
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> Result<()> {
        fs::write(self.wat_path(name), contents)?;
        Ok(())
    }

    pub fn append(&self, name: &str, contents: &[u8]) -> Result<()> {
        use std::io::Write;
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.wat_path(name))?;
        f.write_all(contents)?;
        Ok(())
    }
}

/// Search `dir` and its ancestors for a `.wat/` directory. Returns
/// `NoWorkspaceRoot` at the filesystem root if none is found.
pub fn wat_root(dir: &Path) -> Result<Workspace> {
    let mut cur = dir.to_path_buf();
    loop {
        if cur.join(WAT_DIR).is_dir() {
            return Ok(Workspace { root: cur });
        }
        match cur.parent() {
            Some(parent) => cur = parent.to_path_buf(),
            None => return Err(WatError::NoWorkspaceRoot(dir.to_path_buf())),
        }
    }
}

/// Create `.wat/` at `dir` if it does not already exist there.
pub fn init(dir: &Path) -> Result<Workspace> {
    let wat_dir = dir.join(WAT_DIR);
    if !wat_dir.is_dir() {
        fs::create_dir_all(&wat_dir)?;
    }
    Ok(Workspace {
        root: dir.to_path_buf(),
    })
}

/// Find the workspace rooted above `dir`, creating one at `dir` (and
/// populating `.watignore`) if none exists. `WAT_ROOT`, when set, is used
/// directly instead of searching upward.
pub fn get_or_init(dir: &Path) -> Result<Workspace> {
    if let Ok(root) = std::env::var("WAT_ROOT") {
        return init(Path::new(&root));
    }
    match wat_root(dir) {
        Ok(ws) => Ok(ws),
        Err(WatError::NoWorkspaceRoot(_)) => {
            let ws = init(dir)?;
            crate::ignore::make_wat_ignore(&ws)?;
            Ok(ws)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn wat_root_not_found_at_fs_root() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        assert!(wat_root(&nested).is_err());
    }

    #[test]
    fn wat_root_finds_ancestor() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(WAT_DIR)).unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let ws = wat_root(&nested).unwrap();
        assert_eq!(ws.root, dir.path());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempdir().unwrap();
        init(dir.path()).unwrap();
        assert!(init(dir.path()).is_ok());
        assert!(dir.path().join(WAT_DIR).is_dir());
    }

    #[test]
    fn write_read_append_round_trip() {
        let dir = tempdir().unwrap();
        let ws = init(dir.path()).unwrap();
        ws.write(FNAME_CMDLOG, b"a\n").unwrap();
        ws.append(FNAME_CMDLOG, b"b\n").unwrap();
        assert_eq!(ws.read_to_string(FNAME_CMDLOG).unwrap(), "a\nb\n");
    }
}

//! Filesystem walker, grounded on `original_source/cli/wat/recent.go`.
//!
//! Produces root-relative file listings with modification times, pruning
//! whole directories that the ignore-matcher rejects rather than descending
//! into them. Symlinks are never followed.

use crate::error::Result;
use crate::ignore::IgnoreMatcher;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub mod_time: SystemTime,
}

/// Walk `root`, returning every regular file not matched by `matcher`.
/// Directories matched by `matcher` are pruned entirely. Order is
/// unspecified; callers sort as needed.
pub fn walk_root(root: &Path, matcher: &IgnoreMatcher) -> Result<Vec<FileInfo>> {
    let mut out = Vec::new();
    let mut walker = WalkDir::new(root).follow_links(false).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| std::io::Error::from(e.into_io_error().unwrap_or_else(
            || std::io::Error::other("walk error"),
        )))?;
        let path = entry.path();
        if path == root {
            continue;
        }
        let is_dir = entry.file_type().is_dir();
        if matcher.matches(path, is_dir) {
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }
        if !is_dir {
            if !entry.file_type().is_file() {
                continue;
            }
            let meta = entry.metadata()?;
            let name = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            out.push(FileInfo {
                name,
                mod_time: meta.modified()?,
            });
        }
    }
    Ok(out)
}

/// The `n` most recently edited file names, most recent first.
pub fn recent_file_names(root: &Path, matcher: &IgnoreMatcher, n: usize) -> Result<Vec<String>> {
    let mut files = walk_root(root, matcher)?;
    files.sort_by(|a, b| b.mod_time.cmp(&a.mod_time));
    files.truncate(n);
    Ok(files.into_iter().map(|f| f.name).collect())
}

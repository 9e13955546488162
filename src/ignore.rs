//! `.watignore` handling, grounded on `original_source/cli/wat/ignore.go`.
//!
//! `.watignore` uses gitignore syntax. At init time it is populated from any
//! existing `.gitignore` plus a fixed default list, deduped. Matching itself
//! is delegated to the `ignore` crate's gitignore engine rather than hand
//! rolling pattern parsing.

use crate::error::Result;
use crate::workspace::{FNAME_GITIGNORE, FNAME_WATIGNORE, Workspace};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Default ignore patterns applied even when no `.gitignore` exists.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".wat",
    "node_modules",
    "vendor",
    "*.pyc",
    ".idea",
    "frontend",
    "build",
    "sphinx",
];

/// Populate `<root>/.watignore` from `.gitignore` (if present) plus the
/// default list, deduplicated. A no-op if `.watignore` already exists.
pub fn make_wat_ignore(ws: &Workspace) -> Result<()> {
    let watignore_path = ws.root.join(FNAME_WATIGNORE);
    if watignore_path.exists() {
        return Ok(());
    }
    let contents = make_wat_ignore_contents(&ws.root)?;
    std::fs::write(&watignore_path, contents)?;
    Ok(())
}

fn make_wat_ignore_contents(root: &Path) -> Result<String> {
    let mut existing: Vec<String> = Vec::new();
    let gitignore_path = root.join(FNAME_GITIGNORE);
    if let Ok(text) = std::fs::read_to_string(&gitignore_path) {
        existing.extend(text.lines().map(str::to_string));
    }

    let mut out = existing.clone();
    for default in DEFAULT_IGNORES {
        if !existing.iter().any(|line| line.trim() == *default) {
            out.push(default.to_string());
        }
    }
    let mut text = out.join("\n");
    text.push('\n');
    Ok(text)
}

/// An ignore-matcher over `.watignore` at the workspace root. Matches
/// nothing if `.watignore` is absent (mirrors the original's dummy
/// matcher fallback).
pub struct IgnoreMatcher {
    inner: Option<Gitignore>,
}

impl IgnoreMatcher {
    pub fn load(root: &Path) -> Self {
        let path = root.join(FNAME_WATIGNORE);
        if !path.exists() {
            return IgnoreMatcher { inner: None };
        }
        let mut builder = GitignoreBuilder::new(root);
        if builder.add(&path).is_some() {
            // add() returns an Option<Error> on failure to read; treat a
            // broken file the same as a missing one rather than failing
            // the whole walk.
            return IgnoreMatcher { inner: None };
        }
        match builder.build() {
            Ok(gi) => IgnoreMatcher { inner: Some(gi) },
            Err(_) => IgnoreMatcher { inner: None },
        }
    }

    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        match &self.inner {
            Some(gi) => gi.matched(path, is_dir).is_ignore(),
            None => false,
        }
    }
}

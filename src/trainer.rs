//! The trainer: manufactures bootstrap observations so the history model is
//! non-degenerate before the user has run anything.
//!
//! Grounded on spec.md §4.E and cross-checked against
//! `original_source/cli/wat/train_test.go` (the only surviving trace of the
//! original `train.go`, which the retrieval pack did not include). The
//! fuzz contract itself is a known, intentionally minimal heuristic — see
//! `fuzz` below — not to be extended without evidence from upstream.

use crate::error::{Result, WatError};
use crate::ignore::IgnoreMatcher;
use crate::runner::run_commands;
use crate::store;
use crate::types::{Command, CommandLog, LogContext, LogGroup, Source};
use crate::walker::walk_root;
use crate::workspace::Workspace;
use globset::Glob;
use std::io::sink;
use std::path::Path;
use std::time::Duration;

/// Maximum number of representative files fuzzed per candidate command
/// when more than this many match its pattern.
const MAX_FILES_PER_COMMAND: usize = 3;

/// Default freshness window for bootstrap data: skip training if the log
/// store already holds a bootstrap `LogGroup` younger than this.
pub const TRAIN_TTL: Duration = Duration::from_secs(60 * 60);

/// Runs the trainer if the log store does not already hold fresh data
/// within `ttl`, appending one bootstrap `LogGroup` per fuzzed scenario.
/// Returns the groups produced (empty if training was skipped).
pub fn train(ws: &Workspace, candidates: &[Command], timeout: Duration, ttl: Duration) -> Result<Vec<LogGroup>> {
    if is_fresh(ws, ttl)? {
        return Ok(Vec::new());
    }
    let groups = train_at(ws, candidates, timeout)?;
    store::append(ws, &groups)?;
    Ok(groups)
}

fn is_fresh(ws: &Workspace, ttl: Duration) -> Result<bool> {
    let groups = store::read_all(ws)?;
    let Some(latest) = groups
        .iter()
        .filter(|g| g.context.source == Source::Bootstrap)
        .map(|g| g.context.start_time)
        .max()
    else {
        return Ok(false);
    };
    let age = chrono::Utc::now().signed_duration_since(latest);
    Ok(age.to_std().unwrap_or(Duration::MAX) <= ttl)
}

/// Produces bootstrap log groups without touching the log store, one per
/// (command, representative-file) scenario.
pub fn train_at(ws: &Workspace, candidates: &[Command], timeout: Duration) -> Result<Vec<LogGroup>> {
    let matcher = IgnoreMatcher::load(&ws.root);
    let files = walk_root(&ws.root, &matcher)?;

    let mut groups = Vec::new();
    for cmd in candidates {
        let Ok(glob) = Glob::new(&cmd.file_pattern) else {
            continue;
        };
        let matcher = glob.compile_matcher();
        let mut matching: Vec<&crate::walker::FileInfo> =
            files.iter().filter(|f| matcher.is_match(&f.name)).collect();
        matching.truncate(MAX_FILES_PER_COMMAND);

        for file in matching {
            let path = ws.root.join(&file.name);
            match fuzz_and_run(cmd, &ws.root, &path, timeout) {
                Ok(group) => groups.push(group),
                // Spawn failure, timeout, or other runner/IO error: abort
                // this scenario only, per spec.md §4.E's failure semantics.
                Err(WatError::CancelledOrTimedOut) | Err(WatError::Io(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }
    Ok(groups)
}

/// Fuzzes `path`, runs `cmd` against it under `timeout`, restores the
/// file byte-for-byte on every exit path (including a SIGINT/SIGTERM during
/// the child process), and returns one `LogGroup`.
fn fuzz_and_run(cmd: &Command, root: &Path, path: &Path, timeout: Duration) -> Result<LogGroup> {
    let original = std::fs::read(path)?;
    let mutated = fuzz(&original);

    if mutated != original {
        std::fs::write(path, &mutated)?;
    }

    let restore_path = path.to_path_buf();
    let restore_bytes = original.clone();
    let guard = crate::cleanup::register(move || {
        let _ = std::fs::write(&restore_path, &restore_bytes);
    });

    let result = run_commands(root, std::slice::from_ref(cmd), timeout, &mut sink());
    guard.teardown();

    let log: CommandLog = match result {
        Ok(mut logs) => logs.remove(0),
        Err(e) => return Err(e),
    };

    let name = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();

    Ok(LogGroup {
        context: LogContext {
            recent_edits: vec![name],
            start_time: chrono::Utc::now(),
            source: Source::Bootstrap,
        },
        logs: vec![log],
    })
}

/// The minimal reversible mutation: rewrites the first `false` to `true`,
/// or, failing that, the first standalone `0` token to `1`. Leaves the
/// buffer unchanged if neither pattern is found — this is deliberately
/// weak and language-agnostic, not an invitation to add smarter rules.
pub fn fuzz(input: &[u8]) -> Vec<u8> {
    if let Some(pos) = find_standalone_word(input, b"false") {
        let mut out = input.to_vec();
        out.splice(pos..pos + 5, b"true".iter().copied());
        return out;
    }
    if let Some(pos) = find_standalone_zero(input) {
        let mut out = input.to_vec();
        out[pos] = b'1';
        return out;
    }
    input.to_vec()
}

/// Finds the first occurrence of `needle` not immediately bordered by an
/// alphanumeric byte on either side, so it matches `false` but not the
/// `false` prefix inside `falsey`.
fn find_standalone_word(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&pos| {
        haystack[pos..pos + needle.len()] == *needle
            && !(pos > 0 && haystack[pos - 1].is_ascii_alphanumeric())
            && !((pos + needle.len() < haystack.len())
                && haystack[pos + needle.len()].is_ascii_alphanumeric())
    })
}

/// Finds a `0` byte not adjacent to another ASCII digit on either side, so
/// `100` and `0` inside `falsey`-style longer tokens are excluded.
fn find_standalone_zero(input: &[u8]) -> Option<usize> {
    for (i, &b) in input.iter().enumerate() {
        if b != b'0' {
            continue;
        }
        let prev_digit = i > 0 && input[i - 1].is_ascii_digit();
        let next_digit = i + 1 < input.len() && input[i + 1].is_ascii_digit();
        if !prev_digit && !next_digit {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuzz_rewrites_false_to_true() {
        assert_eq!(fuzz(b"x := false"), b"x := true");
    }

    #[test]
    fn fuzz_rewrites_standalone_zero() {
        assert_eq!(fuzz(b"x := 0"), b"x := 1");
    }

    #[test]
    fn fuzz_does_not_touch_multidigit_zero() {
        assert_eq!(fuzz(b"x := 100"), b"x := 100");
    }

    #[test]
    fn fuzz_does_not_match_falsey() {
        assert_eq!(fuzz(b"x := falsey"), b"x := falsey");
    }

    #[test]
    fn fuzz_prefers_false_over_zero() {
        assert_eq!(fuzz(b"a := 0; b := false"), b"a := 0; b := true");
    }
}

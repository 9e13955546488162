//! Best-effort diagnostics sink for plugin and runner errors.
//!
//! Modeled on the teacher's `analytics::events` append-only JSONL log: a
//! file append that never fails the caller. Writes to
//! `<workspace>/.wat/diagnostics.jsonl` when a workspace is known, and
//! falls back to stderr otherwise — matching `original_source`'s
//! `Fatal`/analytics-event pairing at the CLI edge, minus the network
//! collaborator.

use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use std::sync::Mutex;

const FNAME_DIAGNOSTICS: &str = "diagnostics.jsonl";

static WORKSPACE_ROOT: OnceLock<Mutex<Option<std::path::PathBuf>>> = OnceLock::new();

/// Registers the workspace root diagnostics should append to. Call once,
/// early in `main`, after the workspace is resolved.
pub fn set_workspace_root(root: &Path) {
    let cell = WORKSPACE_ROOT.get_or_init(|| Mutex::new(None));
    *cell.lock().unwrap() = Some(root.to_path_buf());
}

#[derive(Serialize)]
struct DiagnosticEvent<'a> {
    timestamp: chrono::DateTime<Utc>,
    kind: &'a str,
    message: &'a str,
}

/// Appends one diagnostic event. Never panics or propagates an error —
/// a failure to log is itself logged to stderr and otherwise swallowed.
pub fn log_event(kind: &str, message: &str) {
    let event = DiagnosticEvent {
        timestamp: Utc::now(),
        kind,
        message,
    };
    let Ok(line) = serde_json::to_string(&event) else {
        eprintln!("{kind}: {message}");
        return;
    };

    let root = WORKSPACE_ROOT
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap()
        .clone();

    match root {
        Some(root) => {
            let path = root.join(crate::workspace::WAT_DIR).join(FNAME_DIAGNOSTICS);
            if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(f, "{line}");
            } else {
                eprintln!("{line}");
            }
        }
        None => eprintln!("{line}"),
    }
}

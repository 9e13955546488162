//! The log store: append-only `LogGroup` records plus the TTL-cached
//! candidate-command list.
//!
//! Grounded on `original_source/cli/wat/fs.go` (`ReadCmdLogGroups`,
//! `CmdLogGroupsToFile`) and `populate.go` (`List`, `CommandList`).

use crate::error::{Result, WatError};
use crate::types::{Command, LogGroup};
use crate::workspace::{FNAME_CMDLOG, FNAME_LIST, Workspace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TTL for the cached candidate list: 48 hours.
pub const LIST_TTL: Duration = Duration::from_secs(48 * 60 * 60);

/// Appends `groups` to `.wat/cmdlog`, one JSON object per line. A no-op on
/// empty input.
pub fn append(ws: &Workspace, groups: &[LogGroup]) -> Result<()> {
    if groups.is_empty() {
        return Ok(());
    }
    let mut buf = String::new();
    for group in groups {
        let line = serde_json::to_string(group)
            .map_err(|e| WatError::MalformedInput(e.to_string()))?;
        buf.push_str(&line);
        buf.push('\n');
    }
    ws.append(FNAME_CMDLOG, buf.as_bytes())
}

/// Reads every `LogGroup` in `.wat/cmdlog`. A missing file yields an empty
/// list; a corrupt line is fatal (no partial recovery).
pub fn read_all(ws: &Workspace) -> Result<Vec<LogGroup>> {
    if !ws.exists(FNAME_CMDLOG) {
        return Ok(Vec::new());
    }
    let text = ws.read_to_string(FNAME_CMDLOG)?;
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| WatError::MalformedInput(e.to_string()))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommandList {
    timestamp: DateTime<Utc>,
    commands: Vec<Command>,
}

/// Returns the cached candidate list if it is younger than `ttl`; otherwise
/// `None`, signalling the caller should re-populate and call [`save_list`].
pub fn cached_list(ws: &Workspace, ttl: Duration) -> Result<Option<Vec<Command>>> {
    if !ws.exists(FNAME_LIST) {
        return Ok(None);
    }
    let text = ws.read_to_string(FNAME_LIST)?;
    let list: CommandList =
        serde_json::from_str(&text).map_err(|e| WatError::MalformedInput(e.to_string()))?;
    let age = Utc::now().signed_duration_since(list.timestamp);
    if age.to_std().unwrap_or(Duration::MAX) <= ttl {
        Ok(Some(list.commands))
    } else {
        Ok(None)
    }
}

/// Overwrites the cached candidate list with `commands`, stamped now.
pub fn save_list(ws: &Workspace, commands: &[Command]) -> Result<()> {
    let list = CommandList {
        timestamp: Utc::now(),
        commands: commands.to_vec(),
    };
    let text =
        serde_json::to_string_pretty(&list).map_err(|e| WatError::MalformedInput(e.to_string()))?;
    ws.write(FNAME_LIST, text.as_bytes())
}

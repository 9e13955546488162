//! Core value types: candidate commands, observed runs, and the log records
//! that tie them to a context.
//!
//! Everything here is a plain value type with structural equality; none of
//! it owns a file handle or holds a lock. `LogGroup`s are produced by the
//! trainer or a user run, appended to the log store, and later folded into
//! the history model read-only.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A candidate test command and the file glob that makes it relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    pub file_pattern: String,
}

impl Command {
    pub fn new(command: impl Into<String>, file_pattern: impl Into<String>) -> Self {
        Command {
            command: command.into(),
            file_pattern: file_pattern.into(),
        }
    }

    pub fn empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Where a `LogGroup` came from. Bootstrap data is synthetic (produced by
/// the trainer); it is superseded by real user-run data in cost estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    Bootstrap,
    User,
}

/// One observed invocation of a single command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLog {
    pub command: String,
    pub success: bool,
    #[serde(with = "duration_secs_f64")]
    pub duration: Duration,
}

/// The context a `LogGroup` was collected under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogContext {
    pub recent_edits: Vec<String>,
    pub start_time: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub source: Source,
}

/// One cohesive run: a context plus the ordered commands invoked under it.
/// Order inside `logs` seeds pairwise correlation in the history model — a
/// later command is observed conditioned on the success of earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogGroup {
    pub context: LogContext,
    pub logs: Vec<CommandLog>,
}

/// A point in the two-dimensional condition lattice: (most-recently-edited
/// file, most-recently-succeeded command). Either field may be empty,
/// meaning "unconstrained". Immutable; updates are functional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Condition {
    pub edited_file: String,
    pub success_command: String,
}

impl Condition {
    pub fn with_edited_file(&self, file: impl Into<String>) -> Condition {
        Condition {
            edited_file: file.into(),
            success_command: self.success_command.clone(),
        }
    }

    pub fn with_success(&self, command: impl Into<String>) -> Condition {
        Condition {
            edited_file: self.edited_file.clone(),
            success_command: command.into(),
        }
    }

    /// Strictly broader points than `self`, narrowest first, in a fixed
    /// order so fallback lookup is deterministic. At most three entries:
    /// "edited only" has one ancestor (the empty condition); "both" has
    /// two, `{success only}` then `{edited only}` is skipped in favor of
    /// `{}` directly since dropping either field independently yields the
    /// same two intermediate points plus the fully empty one.
    pub fn ancestors(&self) -> Vec<Condition> {
        let has_edit = !self.edited_file.is_empty();
        let has_success = !self.success_command.is_empty();
        let mut out = Vec::with_capacity(3);
        match (has_edit, has_success) {
            (true, true) => {
                out.push(Condition {
                    edited_file: String::new(),
                    success_command: self.success_command.clone(),
                });
                out.push(Condition {
                    edited_file: self.edited_file.clone(),
                    success_command: String::new(),
                });
                out.push(Condition::default());
            }
            (true, false) | (false, true) => {
                out.push(Condition::default());
            }
            (false, false) => {}
        }
        out
    }
}

/// Running cost estimate for a single command across all conditions.
/// `real` is true once any non-bootstrap observation has been folded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    #[serde(with = "duration_secs_f64")]
    pub duration: Duration,
    pub count: u32,
    pub real: bool,
}

impl Default for CostEstimate {
    fn default() -> Self {
        CostEstimate {
            duration: Duration::ZERO,
            count: 0,
            real: false,
        }
    }
}

/// Per-(command, condition) success/failure tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultHistory {
    pub success_count: u32,
    pub fail_count: u32,
}

impl ResultHistory {
    pub fn record(&mut self, success: bool) {
        if success {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
    }
}

/// Serializes a `Duration` as fractional seconds, matching the teacher's
/// pattern of representing timespans as plain numbers rather than nested
/// objects in the JSONL log.
mod duration_secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_empty() {
        assert!(Command::new("", "").empty());
        assert!(!Command::new("cargo test", "src/**").empty());
    }

    #[test]
    fn ancestors_both_set() {
        let c = Condition {
            edited_file: "a.rs".into(),
            success_command: "cargo test".into(),
        };
        let a = c.ancestors();
        assert_eq!(
            a,
            vec![
                Condition {
                    edited_file: String::new(),
                    success_command: "cargo test".into()
                },
                Condition {
                    edited_file: "a.rs".into(),
                    success_command: String::new()
                },
                Condition::default(),
            ]
        );
    }

    #[test]
    fn ancestors_one_set() {
        let c = Condition {
            edited_file: "a.rs".into(),
            success_command: String::new(),
        };
        assert_eq!(c.ancestors(), vec![Condition::default()]);
    }

    #[test]
    fn ancestors_unconstrained() {
        assert!(Condition::default().ancestors().is_empty());
    }

    #[test]
    fn log_group_round_trip() {
        let group = LogGroup {
            context: LogContext {
                recent_edits: vec!["a.rs".into()],
                start_time: chrono::Utc::now(),
                source: Source::User,
            },
            logs: vec![CommandLog {
                command: "cargo test".into(),
                success: true,
                duration: Duration::from_secs_f64(1.5),
            }],
        };
        let encoded = serde_json::to_string(&group).unwrap();
        let decoded: LogGroup = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.context.recent_edits, group.context.recent_edits);
        assert_eq!(decoded.logs, group.logs);
    }

    #[test]
    fn missing_source_defaults_to_bootstrap() {
        let json = r#"{"recent_edits":[],"start_time":"2024-01-01T00:00:00Z"}"#;
        let ctx: LogContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.source, Source::Bootstrap);
    }
}

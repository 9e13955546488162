//! The history model: an in-memory store of per-command cost estimates and
//! per-(command, condition) success/failure histories.
//!
//! Grounded line-by-line on `original_source/cli/wat/decide.go`'s
//! `DecisionStore`. Rebuilt from the log store at the start of every
//! decision round; it has no durable form of its own.

use crate::types::{Command, CommandLog, Condition, CostEstimate, LogGroup, ResultHistory};
use std::collections::HashMap;

/// Boost applied to a new cost sample's weight so it is never drowned out
/// by a long history of old samples.
const W_EXTRA: f64 = 0.2;

/// Default zero-case substitute for an unseen success/fail count.
const FAIL_PROBABILITY_ZERO_CASE: f64 = 0.1;

/// Zero-case substitute used when the command's file pattern matches the
/// condition's edited file — an untested command facing a just-edited file
/// it covers is assumed maximally likely to fail.
const FAIL_PROBABILITY_ZERO_CASE_PATTERN_MATCH: f64 = 1.0;

#[derive(Default)]
pub struct DecisionStore {
    costs: HashMap<String, CostEstimate>,
    history: HashMap<(String, Condition), ResultHistory>,
}

impl DecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a LogGroup>) -> Self {
        let mut store = Self::new();
        for group in groups {
            store.add_group(group);
        }
        store
    }

    pub fn add_group(&mut self, group: &LogGroup) {
        let is_real = group.context.source == crate::types::Source::User;
        for log in &group.logs {
            self.add_cost_sample(&log.command, log.duration.as_secs_f64(), is_real);
            self.add_command_history(log, &group.context.recent_edits);
        }
        self.add_correlations(group);
    }

    /// Folds `log`'s duration into `cmd`'s cost estimate, honoring the
    /// bootstrap-vs-real discipline from the history-model spec.
    pub fn add_cost_sample(&mut self, command: &str, duration_secs: f64, real: bool) {
        let entry = self.costs.entry(command.to_string()).or_default();
        *entry = entry.add(duration_secs, real);
    }

    fn add_command_history(&mut self, log: &CommandLog, recent_edits: &[String]) {
        self.history
            .entry((log.command.clone(), Condition::default()))
            .or_default()
            .record(log.success);

        for file in recent_edits {
            self.history
                .entry((log.command.clone(), Condition::default().with_edited_file(file.clone())))
                .or_default()
                .record(log.success);
        }
    }

    fn add_correlations(&mut self, group: &LogGroup) {
        let logs = &group.logs;
        for i in 0..logs.len() {
            for j in (i + 1)..logs.len() {
                let (li, lj) = (&logs[i], &logs[j]);
                if li.success {
                    self.history
                        .entry((
                            lj.command.clone(),
                            Condition::default().with_success(li.command.clone()),
                        ))
                        .or_default()
                        .record(lj.success);
                }
                if lj.success {
                    self.history
                        .entry((
                            li.command.clone(),
                            Condition::default().with_success(lj.command.clone()),
                        ))
                        .or_default()
                        .record(li.success);
                }
            }
        }
    }

    pub fn has_cost(&self, command: &str) -> bool {
        self.costs.contains_key(command)
    }

    pub fn cost(&self, command: &str) -> f64 {
        self.costs
            .get(command)
            .map(|c| c.duration.as_secs_f64())
            .unwrap_or(0.0)
    }

    pub fn failure_probability(&self, cmd: &Command, condition: &Condition) -> f64 {
        let (success, fail) = self.lookup_history(&cmd.command, condition);

        let pattern_matches = !condition.edited_file.is_empty()
            && glob_match(&cmd.file_pattern, &condition.edited_file);
        let zero = if pattern_matches {
            FAIL_PROBABILITY_ZERO_CASE_PATTERN_MATCH
        } else {
            FAIL_PROBABILITY_ZERO_CASE
        };

        let fail = if fail == 0 { zero } else { fail as f64 };
        let success = if success == 0 { zero } else { success as f64 };
        fail / (fail + success)
    }

    /// Exact lookup for `(command, condition)`, falling back through
    /// ancestors narrowest to broadest. Returns `(success_count, fail_count)`
    /// as `0, 0` if nothing is found anywhere in the chain.
    fn lookup_history(&self, command: &str, condition: &Condition) -> (u32, u32) {
        if let Some(h) = self.history.get(&(command.to_string(), condition.clone())) {
            return (h.success_count, h.fail_count);
        }
        for ancestor in condition.ancestors() {
            if let Some(h) = self.history.get(&(command.to_string(), ancestor)) {
                return (h.success_count, h.fail_count);
            }
        }
        (0, 0)
    }

    /// `p^2 / duration_seconds`. Commands with unknown cost (duration 0)
    /// are treated as infinitely valuable via a tiny epsilon floor rather
    /// than dividing by zero.
    pub fn cost_sensitive_gain(&self, cmd: &Command, condition: &Condition) -> f64 {
        let p = self.failure_probability(cmd, condition);
        let duration = self.cost(&cmd.command).max(1e-9);
        (p * p) / duration
    }
}

impl CostEstimate {
    /// Folds a new sample into this estimate per the bootstrap-vs-real
    /// discipline: real data always supersedes bootstrap-only estimates;
    /// bootstrap samples are ignored once a real estimate exists; otherwise
    /// fold with a weighted average that boosts the new sample's weight by
    /// `W_EXTRA` so it is never drowned out.
    fn add(self, sample_duration_secs: f64, sample_is_real: bool) -> CostEstimate {
        if sample_is_real && !self.real {
            return CostEstimate {
                duration: std::time::Duration::from_secs_f64(sample_duration_secs.max(0.0)),
                count: 1,
                real: true,
            };
        }
        if self.real && !sample_is_real {
            return self;
        }

        let old_count = self.count as f64;
        let new_count = old_count + 1.0;
        let old_weight = (old_count / new_count) - W_EXTRA;
        let new_weight = (1.0 / new_count) + W_EXTRA;
        let new_duration =
            old_weight * self.duration.as_secs_f64() + new_weight * sample_duration_secs;

        CostEstimate {
            duration: std::time::Duration::from_secs_f64(new_duration.max(0.0)),
            count: self.count + 1,
            real: self.real,
        }
    }
}

/// Glob match using conventional `*`/`**` semantics against a
/// workspace-relative path.
fn glob_match(pattern: &str, path: &str) -> bool {
    match globset::Glob::new(pattern) {
        Ok(g) => g.compile_matcher().is_match(path),
        Err(_) => pattern == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogContext, Source};

    fn group(recent_edits: Vec<&str>, logs: Vec<(&str, bool)>) -> LogGroup {
        LogGroup {
            context: LogContext {
                recent_edits: recent_edits.into_iter().map(String::from).collect(),
                start_time: chrono::Utc::now(),
                source: Source::User,
            },
            logs: logs
                .into_iter()
                .map(|(c, s)| CommandLog {
                    command: c.into(),
                    success: s,
                    duration: std::time::Duration::from_secs(1),
                })
                .collect(),
        }
    }

    #[test]
    fn failure_probability_in_bounds() {
        let mut store = DecisionStore::new();
        store.add_group(&group(vec!["a.rs"], vec![("cargo test", false)]));
        let cmd = Command::new("cargo test", "*.rs");
        let p = store.failure_probability(&cmd, &Condition::default());
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn pattern_boost_keeps_probability_at_half_with_empty_history() {
        let store = DecisionStore::new();
        let cmd = Command::new("cargo test", "*.rs");
        let cond = Condition::default().with_edited_file("a.rs");
        assert_eq!(store.failure_probability(&cmd, &cond), 0.5);
        let cond_no_match = Condition::default().with_edited_file("a.rs");
        let cmd_no_match = Command::new("cargo test", "*.go");
        assert_eq!(store.failure_probability(&cmd_no_match, &cond_no_match), 0.5);
    }

    #[test]
    fn pattern_boost_diverges_after_one_success() {
        let mut store = DecisionStore::new();
        store.add_group(&group(vec![], vec![("cargo test", true)]));
        let matching = Command::new("cargo test", "*.rs");
        let cond = Condition::default().with_edited_file("a.rs");
        assert_eq!(store.failure_probability(&matching, &cond), 0.5);

        let non_matching = Command::new("cargo test", "*.go");
        assert!((store.failure_probability(&non_matching, &cond) - 0.0909).abs() < 0.001);
    }

    #[test]
    fn cost_weighted_average_matches_s5() {
        let mut estimate = CostEstimate {
            duration: std::time::Duration::from_secs(1),
            count: 1,
            real: true,
        };
        estimate = estimate.add(60.0, true);
        assert!((estimate.duration.as_secs_f64() - 18.7).abs() < 0.01);
    }

    #[test]
    fn real_data_supersedes_bootstrap() {
        let mut store = DecisionStore::new();
        store.add_cost_sample("cargo test", 5.0, false);
        store.add_cost_sample("cargo test", 2.0, true);
        assert_eq!(store.cost("cargo test"), 2.0);
        store.add_cost_sample("cargo test", 100.0, false);
        assert_eq!(store.cost("cargo test"), 2.0);
    }

    #[test]
    fn correlation_recorded_both_directions() {
        let mut store = DecisionStore::new();
        store.add_group(&group(vec![], vec![("a", true), ("b", true)]));
        let cond_a_success = Condition::default().with_success("a");
        let (s, _) = store.lookup_history("b", &cond_a_success);
        assert_eq!(s, 1);
        let cond_b_success = Condition::default().with_success("b");
        let (s2, _) = store.lookup_history("a", &cond_b_success);
        assert_eq!(s2, 1);
    }
}

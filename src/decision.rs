//! The decision engine: a multi-stage ranker over candidate commands.
//!
//! Grounded line-by-line on `original_source/cli/wat/decide.go`'s
//! `gainDecideWith`/`secondTierDecideWith`/`recencyDecideWith`/
//! `cheapestDecideWith`/`naiveDecideWith`. Pure: never mutates its inputs,
//! never performs I/O.

use crate::history::DecisionStore;
use crate::types::{Command, Condition};

/// Top-N recommended commands, in the order they should be run.
///
/// `files_by_recency_desc` is the walker's output sorted most-recently
/// edited first. Empty candidates or `n <= 0` yield an empty result.
/// Ties are broken by input order throughout — the function is
/// deterministic given identical inputs.
pub fn decide(
    candidates: &[Command],
    store: &DecisionStore,
    files_by_recency_desc: &[String],
    n: usize,
) -> Vec<Command> {
    if candidates.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut remainder: Vec<Command> = candidates.to_vec();
    let mut result: Vec<Command> = Vec::new();
    let mut condition = Condition {
        edited_file: files_by_recency_desc
            .first()
            .cloned()
            .unwrap_or_default(),
        success_command: String::new(),
    };

    while result.len() < n && !remainder.is_empty() {
        let max_gain = remainder
            .iter()
            .map(|c| store.cost_sensitive_gain(c, &condition))
            .fold(f64::NEG_INFINITY, f64::max);

        // Split remainder into the tie set (in original relative order)
        // and the rest, preserving each side's relative order.
        let mut tied = Vec::new();
        let mut untied = Vec::new();
        for c in remainder {
            if (store.cost_sensitive_gain(&c, &condition) - max_gain).abs() < f64::EPSILON {
                tied.push(c);
            } else {
                untied.push(c);
            }
        }

        let room = n - result.len();
        let group: Vec<Command> = if tied.len() <= room {
            tied
        } else {
            // Not enough room for the whole tie set: take the first and
            // put the rest back into the pool for a later round.
            let head = tied.remove(0);
            untied.splice(0..0, tied);
            vec![head]
        };

        let group_size = group.len();
        let ordered_group = second_tier_decide(group, store, files_by_recency_desc, group_size);
        let head = ordered_group.first().cloned();
        result.extend(ordered_group);
        remainder = untied;

        if let Some(head) = head {
            condition = condition.with_success(head.command);
        }
    }

    result.truncate(n);
    result
}

/// Orders a tie group by chaining recency → cheapest → naive passes.
fn second_tier_decide(
    group: Vec<Command>,
    store: &DecisionStore,
    files_by_recency_desc: &[String],
    needed: usize,
) -> Vec<Command> {
    let (mut ordered, remainder) = recency_decide(group, files_by_recency_desc, needed);
    let (cheap, remainder) = cheapest_decide(remainder, store, needed.saturating_sub(ordered.len()));
    ordered.extend(cheap);
    let naive = naive_decide(remainder, needed.saturating_sub(ordered.len()));
    ordered.extend(naive);
    ordered
}

/// For each file in descending-mtime order, picks the first remaining
/// command in `pool` whose `file_pattern` matches, until `n` are chosen or
/// files are exhausted.
fn recency_decide(
    pool: Vec<Command>,
    files_by_recency_desc: &[String],
    n: usize,
) -> (Vec<Command>, Vec<Command>) {
    let mut pool = pool;
    let mut result = Vec::new();
    for file in files_by_recency_desc {
        if result.len() >= n {
            break;
        }
        if let Some(idx) = pool.iter().position(|c| glob_match(&c.file_pattern, file)) {
            result.push(pool.remove(idx));
        }
    }
    (result, pool)
}

/// Among commands with a known cost, cheapest first.
fn cheapest_decide(pool: Vec<Command>, store: &DecisionStore, n: usize) -> (Vec<Command>, Vec<Command>) {
    let (mut known, unknown): (Vec<Command>, Vec<Command>) =
        pool.into_iter().partition(|c| store.has_cost(&c.command));
    known.sort_by(|a, b| {
        store
            .cost(&a.command)
            .partial_cmp(&store.cost(&b.command))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let taken = known.len().min(n);
    let result = known.drain(..taken).collect();
    let mut remainder = known;
    remainder.extend(unknown);
    (result, remainder)
}

/// Takes the remaining needed commands in input order.
fn naive_decide(pool: Vec<Command>, n: usize) -> Vec<Command> {
    pool.into_iter().take(n).collect()
}

fn glob_match(pattern: &str, path: &str) -> bool {
    match globset::Glob::new(pattern) {
        Ok(g) => g.compile_matcher().is_match(path),
        Err(_) => pattern == path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DecisionStore;

    fn cmd(name: &str, pattern: &str) -> Command {
        Command::new(name, pattern)
    }

    #[test]
    fn s1_three_up_recency() {
        let candidates = vec![
            cmd("A", "a.txt"),
            cmd("B", "b.txt"),
            cmd("C", "c.txt"),
        ];
        let files = vec!["a.txt".into(), "b.txt".into(), "c.txt".into(), "d.txt".into()];
        let store = DecisionStore::new();
        let result = decide(&candidates, &store, &files, 3);
        let names: Vec<&str> = result.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn s2_reorder_by_recency() {
        let candidates = vec![
            cmd("C", "c.txt"),
            cmd("A", "a.txt"),
            cmd("B", "b.txt"),
        ];
        let files = vec!["a.txt".into(), "b.txt".into(), "c.txt".into(), "d.txt".into()];
        let store = DecisionStore::new();
        let result = decide(&candidates, &store, &files, 3);
        let names: Vec<&str> = result.iter().map(|c| c.command.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_candidates_yield_empty_result() {
        let store = DecisionStore::new();
        assert!(decide(&[], &store, &[], 3).is_empty());
    }

    #[test]
    fn zero_n_yields_empty_result() {
        let store = DecisionStore::new();
        let candidates = vec![cmd("A", "*.rs")];
        assert!(decide(&candidates, &store, &[], 0).is_empty());
    }

    #[test]
    fn bounded_output_no_repeats() {
        let store = DecisionStore::new();
        let candidates = vec![cmd("A", "*.rs"), cmd("B", "*.go")];
        let result = decide(&candidates, &store, &[], 5);
        assert!(result.len() <= candidates.len());
        let mut names: Vec<&str> = result.iter().map(|c| c.command.as_str()).collect();
        let before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}

//! Reconciliation of the current matrix with the previous build's.
//!
//! Every current group is matched against at most one previous group. Refs
//! the previous build owned (`unlink`) whose entry is gone or changed are
//! staged for deletion. Previous groups without a current counterpart are
//! carried forward at a stable position; they are never pruned, even if their
//! targets no longer exist.

use crate::core::refs::Group;

/// Stage the stale entries of a matched previous group for deletion.
fn stage_stale(current: &Group, previous: &Group, unlink: &mut Vec<String>) {
    for old in &previous.refs {
        if !old.unlink {
            continue;
        }
        let stale = match current.find(&old.file) {
            Some(found) => found.entry != old.entry,
            None => true,
        };
        if stale {
            unlink.push(old.entry.clone());
        }
    }
}

/// Merge the current matrix with the previous one.
///
/// Returns the merged matrix; stale entries are appended to `unlink`.
pub fn reconcile(current: Vec<Group>, previous: Vec<Group>, unlink: &mut Vec<String>) -> Vec<Group> {
    let mut merged: Vec<Group> = Vec::with_capacity(current.len() + previous.len());
    // For each merged group: the previous group it came from, if any.
    let mut origins: Vec<Option<usize>> = Vec::with_capacity(merged.capacity());
    let mut consumed = vec![false; previous.len()];

    for group in current {
        let matched = previous
            .iter()
            .enumerate()
            .position(|(index, prev)| !consumed[index] && group.corresponds_to(prev));

        if let Some(index) = matched {
            consumed[index] = true;
            stage_stale(&group, &previous[index], unlink);
        }

        merged.push(group);
        origins.push(matched);
    }

    let carried: Vec<usize> = (0..previous.len()).filter(|&i| !consumed[i]).collect();
    let mut previous: Vec<Option<Group>> = previous.into_iter().map(Some).collect();

    for index in carried {
        let Some(group) = previous[index].take() else {
            continue;
        };

        let next_consumed = (index + 1..consumed.len()).find(|&next| consumed[next]);
        let position = next_consumed
            .and_then(|next| origins.iter().position(|o| *o == Some(next)))
            .map(|mut position| {
                // Also go before new groups leading up to the next match.
                while position > 0 && origins[position - 1].is_none() {
                    position -= 1;
                }
                position
            });

        tracing::debug!("Carrying forward group {}", group.key);
        match position {
            Some(position) => {
                merged.insert(position, group);
                origins.insert(position, Some(index));
            }
            None => {
                merged.push(group);
                origins.push(Some(index));
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::refs::{GroupKey, Ref};
    use crate::core::state::PersistedState;
    use serde_json::json;

    fn owned(file: &str, entry: &str) -> Ref {
        Ref {
            file: file.to_string(),
            entry: entry.to_string(),
            unlink: true,
        }
    }

    fn named(key: &str, refs: Vec<Ref>) -> Group {
        Group::new(GroupKey::Name(key.to_string()), refs)
    }

    fn keys(groups: &[Group]) -> Vec<String> {
        groups.iter().map(|g| g.key.to_string()).collect()
    }

    #[test]
    fn test_idempotent() {
        let matrix = vec![
            Group::singleton(0, owned("a.js", "a.1.js")),
            named("lib", vec![owned("l.js", "l.1.js"), Ref::declared("x.js")]),
            Group::singleton(2, owned("b.css", "b.1.css")),
        ];

        let mut unlink = Vec::new();
        let merged = reconcile(matrix.clone(), matrix.clone(), &mut unlink);

        assert!(unlink.is_empty());
        assert_eq!(merged, matrix);
    }

    #[test]
    fn test_changed_group_keeps_position() {
        let previous = vec![
            named("a", vec![owned("a.js", "a.1.js")]),
            named("b", vec![owned("b.js", "b.1.js")]),
            named("c", vec![owned("c.js", "c.1.js")]),
        ];
        let current = vec![
            named("a", vec![owned("a.js", "a.1.js")]),
            named("b", vec![owned("b.js", "b.2.js")]),
            named("c", vec![owned("c.js", "c.1.js")]),
        ];

        let mut unlink = Vec::new();
        let merged = reconcile(current.clone(), previous, &mut unlink);

        assert_eq!(merged, current);
        assert_eq!(unlink, vec!["b.1.js"]);
    }

    #[test]
    fn test_omitted_group_is_carried_in_place() {
        let previous = vec![
            Group::singleton(0, owned("a.js", "a.1.js")),
            Group::singleton(1, owned("b.js", "b.1.js")),
            Group::singleton(2, owned("c.js", "c.1.js")),
        ];
        let current = vec![
            Group::singleton(0, owned("a.js", "a.2.js")),
            Group::singleton(1, owned("c.js", "c.2.js")),
        ];

        let mut unlink = Vec::new();
        let merged = reconcile(current, previous, &mut unlink);

        let files: Vec<&str> = merged.iter().map(|g| g.refs[0].file.as_str()).collect();
        assert_eq!(files, vec!["a.js", "b.js", "c.js"]);
        // b.1.js is still listed by the carried group, so it is not deleted.
        assert_eq!(unlink, vec!["a.1.js", "c.1.js"]);
        assert_eq!(merged[1].refs[0].entry, "b.1.js");
    }

    #[test]
    fn test_matched_group_drops_refs() {
        let previous = vec![named("lib", vec![owned("a.js", "a.1.js"), owned("b.js", "b.1.js")])];
        let current = vec![named("lib", vec![owned("a.js", "a.1.js")])];

        let mut unlink = Vec::new();
        reconcile(current, previous, &mut unlink);
        assert_eq!(unlink, vec!["b.1.js"]);
    }

    #[test]
    fn test_declared_refs_are_never_unlinked() {
        let previous = vec![named("lib", vec![Ref::declared("a.js")])];
        let current = vec![named("lib", vec![Ref::declared("b.js")])];

        let mut unlink = Vec::new();
        reconcile(current, previous, &mut unlink);
        assert!(unlink.is_empty());
    }

    #[test]
    fn test_carried_groups_keep_relative_order() {
        let previous = vec![
            named("x", vec![owned("x.js", "x.js")]),
            named("y", vec![owned("y.js", "y.js")]),
            named("c", vec![owned("c.js", "c.js")]),
            named("z", vec![owned("z.js", "z.js")]),
        ];
        let current = vec![
            named("n", vec![owned("n.js", "n.js")]),
            named("c", vec![owned("c.js", "c.js")]),
        ];

        let mut unlink = Vec::new();
        let merged = reconcile(current, previous, &mut unlink);
        assert_eq!(keys(&merged), vec!["x", "y", "n", "c", "z"]);
    }

    #[test]
    fn test_previous_group_consumed_once() {
        let previous = vec![Group::singleton(0, owned("a.js", "a.1.js"))];
        let current = vec![
            Group::singleton(0, owned("a.js", "a.2.js")),
            Group::new(GroupKey::Index(1), vec![owned("a.js", "a.2.js"), owned("b.js", "b.js")]),
        ];

        let mut unlink = Vec::new();
        let merged = reconcile(current, previous, &mut unlink);
        assert_eq!(merged.len(), 2);
        assert_eq!(unlink, vec!["a.1.js"]);
    }

    #[test]
    fn test_positional_never_matches_named() {
        let previous = vec![named("lib", vec![owned("a.js", "a.1.js")])];
        let current = vec![Group::singleton(0, owned("a.js", "a.2.js"))];

        let mut unlink = Vec::new();
        let merged = reconcile(current, previous, &mut unlink);
        assert!(unlink.is_empty());
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_legacy_state_reconciles_like_wrapped() {
        let current = vec![
            Group::singleton(0, owned("a.js", "a.2.js")),
            named("lib", vec![owned("l.js", "l.2.js")]),
        ];

        let wrapped = json!({
            "refs": [
                {"key": 0, "refs": [{"file": "a.js", "entry": "a.1.js", "unlink": true}]},
                {"key": "lib", "refs": [{"file": "l.js", "entry": "l.1.js", "unlink": true}]},
                {"key": 2, "refs": [{"file": "gone.js", "entry": "gone.1.js", "unlink": true}]}
            ],
            "manifest": "manifest.json"
        });
        let legacy = json!({
            "refs": [
                [{"file": "a.js", "entry": "a.1.js", "unlink": true}],
                [{"file": "l.js", "entry": "l.1.js", "unlink": true}],
                [{"file": "gone.js", "entry": "gone.1.js", "unlink": true}]
            ],
            "manifest": "manifest.json"
        });

        let run = |value| {
            let state = PersistedState::from_value(value, &current).unwrap();
            let mut unlink = Vec::new();
            let merged = reconcile(current.clone(), state.refs, &mut unlink);
            (merged, unlink)
        };

        assert_eq!(run(wrapped), run(legacy));
    }
}

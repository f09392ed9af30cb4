//! Folds an ordered decision list into one merged document.

use serde_json::Value;

use docmerge_diff::{get_at, patch, set_at, DiffOp, Key};

use crate::normalize::push_path;
use crate::resolve::{resolve_action, split_string_path};
use crate::types::{MergeAction, MergeDecision, MergeError};

/// Decisions sharing one container path are collected and flushed as a
/// single patch of the node that was there when the group opened.
struct Group {
    path: Vec<Key>,
    resolved: Value,
    ops: Vec<DiffOp>,
    /// A `ClearParent` decision voids every other op in the group.
    clearing: bool,
}

fn resolve_node(doc: &Value, path: &[Key]) -> Result<Value, MergeError> {
    let mut node = doc;
    for key in path {
        node = get_at(node, std::slice::from_ref(key)).ok_or_else(|| {
            MergeError::PathResolution {
                path: path.to_vec(),
                key: key.clone(),
            }
        })?;
    }
    Ok(node.clone())
}

fn flush(merged: &mut Value, group: Group) -> Result<(), MergeError> {
    let patched = patch(&group.resolved, &group.ops)?;
    set_at(merged, &group.path, patched)?;
    Ok(())
}

/// Applies `decisions` to a working copy of `base` and returns the merged
/// document.
///
/// The list must already be in the order produced by
/// [`crate::sort_decisions`] (deepest paths first, higher sequence indices
/// before lower ones): the grouping below relies on equal paths being
/// adjacent, and the write-back relies on children being fully resolved
/// before any ancestor's own edits run. On error no usable output exists;
/// the partially built copy is discarded.
pub fn apply_decisions(base: &Value, decisions: &[MergeDecision]) -> Result<Value, MergeError> {
    let mut merged = base.clone();
    let mut group: Option<Group> = None;
    for decision in decisions {
        let (path, line) = split_string_path(&merged, &decision.common_path)?;
        let same_group = matches!(&group, Some(current) if current.path == path);
        if same_group {
            if let Some(current) = group.as_mut() {
                if decision.action == MergeAction::ClearParent {
                    // Overrides the group: drop everything collected so
                    // far, including any earlier clear.
                    current.ops.clear();
                    current.clearing = true;
                } else if current.clearing {
                    continue;
                }
                let mut ops = resolve_action(&current.resolved, decision)?;
                if !line.is_empty() {
                    ops = push_path(&line, ops);
                }
                current.ops.extend(ops);
            }
        } else {
            if let Some(finished) = group.take() {
                flush(&mut merged, finished)?;
            }
            let resolved = resolve_node(&merged, &path)?;
            let mut ops = resolve_action(&resolved, decision)?;
            if !line.is_empty() {
                ops = push_path(&line, ops);
            }
            group = Some(Group {
                path,
                resolved,
                ops,
                clearing: decision.action == MergeAction::ClearParent,
            });
        }
    }
    if let Some(finished) = group.take() {
        flush(&mut merged, finished)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn one_sided_local(path: Vec<Key>, ops: Vec<DiffOp>) -> MergeDecision {
        MergeDecision {
            common_path: path,
            action: MergeAction::Local,
            local_diff: ops,
            remote_diff: vec![],
            custom_diff: None,
            conflict: false,
        }
    }

    #[test]
    fn empty_decision_list_returns_base() {
        let base = json!({"a": 1});
        assert_eq!(apply_decisions(&base, &[]).unwrap(), base);
    }

    #[test]
    fn root_group_replaces_document() {
        let base = json!({"a": 1});
        let decisions = vec![one_sided_local(
            vec![],
            vec![DiffOp::Replace {
                key: Key::from("a"),
                value: json!(2),
            }],
        )];
        assert_eq!(apply_decisions(&base, &decisions).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn groups_at_same_path_flush_together() {
        let base = json!({"a": {"x": 1, "y": 2}});
        let decisions = vec![
            one_sided_local(
                vec![Key::from("a")],
                vec![DiffOp::Replace {
                    key: Key::from("x"),
                    value: json!(10),
                }],
            ),
            one_sided_local(
                vec![Key::from("a")],
                vec![DiffOp::Replace {
                    key: Key::from("y"),
                    value: json!(20),
                }],
            ),
        ];
        assert_eq!(
            apply_decisions(&base, &decisions).unwrap(),
            json!({"a": {"x": 10, "y": 20}})
        );
    }

    #[test]
    fn clear_parent_overrides_other_ops_in_group() {
        let base = json!({"a": {"x": 1}, "keep": true});
        let decisions = vec![
            one_sided_local(
                vec![],
                vec![DiffOp::Replace {
                    key: Key::from("keep"),
                    value: json!(false),
                }],
            ),
            MergeDecision {
                common_path: vec![],
                action: MergeAction::ClearParent,
                local_diff: vec![],
                remote_diff: vec![],
                custom_diff: None,
                conflict: false,
            },
            // Dropped: the group is already clearing.
            one_sided_local(
                vec![],
                vec![DiffOp::Replace {
                    key: Key::from("a"),
                    value: json!(null),
                }],
            ),
        ];
        assert_eq!(apply_decisions(&base, &decisions).unwrap(), json!({}));
    }

    #[test]
    fn sequence_ops_address_base_relative_indices() {
        // The removal at index 0 must not shift the replace at index 2.
        let base = json!([10, 20, 30]);
        let decisions = vec![
            one_sided_local(
                vec![],
                vec![
                    DiffOp::RemoveRange {
                        key: Key::Index(0),
                        length: 1,
                    },
                    DiffOp::Replace {
                        key: Key::Index(2),
                        value: json!(33),
                    },
                ],
            ),
        ];
        assert_eq!(
            apply_decisions(&base, &decisions).unwrap(),
            json!([20, 33])
        );
    }

    #[test]
    fn out_of_sync_path_is_reported() {
        let base = json!({"a": 1});
        let decisions = vec![one_sided_local(
            vec![Key::from("gone")],
            vec![DiffOp::Replace {
                key: Key::from("x"),
                value: json!(0),
            }],
        )];
        let err = apply_decisions(&base, &decisions).unwrap_err();
        assert!(matches!(err, MergeError::PathResolution { .. }));
    }
}

//! Turns one decision plus the document node at its path into concrete
//! diff operations.

use serde_json::{json, Value};

use docmerge_diff::{get_at, split_lines, DiffOp, Key};

use crate::types::{MergeAction, MergeDecision, MergeError};

// ── Cleared values ────────────────────────────────────────────────────────

/// The empty form of a value's type: mapping to `{}`, sequence to `[]`,
/// text to `""`, anything atomic to null.
pub fn make_cleared_value(value: &Value) -> Value {
    match value {
        Value::Object(_) => json!({}),
        Value::Array(_) => json!([]),
        Value::String(_) => json!(""),
        _ => Value::Null,
    }
}

// ── Action resolution ─────────────────────────────────────────────────────

/// Resolves `decision` against `base`, the document node at the decision's
/// path, into the ordered diff ops to apply there. Pure; the node is only
/// inspected for the `Clear`/`ClearParent` actions.
pub fn resolve_action(base: &Value, decision: &MergeDecision) -> Result<Vec<DiffOp>, MergeError> {
    match decision.action {
        MergeAction::Base => Ok(vec![]),
        MergeAction::Local | MergeAction::Either => Ok(decision.local_diff.clone()),
        MergeAction::Remote => Ok(decision.remote_diff.clone()),
        MergeAction::Custom => decision.custom_diff.clone().ok_or_else(|| {
            MergeError::InvalidDecisionShape("custom action without custom_diff".to_string())
        }),
        MergeAction::LocalThenRemote => {
            let mut ops = decision.local_diff.clone();
            ops.extend(decision.remote_diff.iter().cloned());
            Ok(ops)
        }
        MergeAction::RemoteThenLocal => {
            let mut ops = decision.remote_diff.clone();
            ops.extend(decision.local_diff.iter().cloned());
            Ok(ops)
        }
        MergeAction::Clear => {
            let key = shared_target_key(decision)?;
            let target = get_at(base, std::slice::from_ref(&key)).ok_or_else(|| {
                MergeError::PathResolution {
                    path: decision.common_path.clone(),
                    key: key.clone(),
                }
            })?;
            Ok(vec![DiffOp::Replace {
                value: make_cleared_value(target),
                key,
            }])
        }
        MergeAction::ClearParent => match base {
            Value::Object(map) => Ok(map
                .keys()
                .map(|k| DiffOp::Remove {
                    key: Key::Name(k.clone()),
                })
                .collect()),
            Value::Array(items) => Ok(vec![DiffOp::RemoveRange {
                key: Key::Index(0),
                length: items.len(),
            }]),
            Value::String(text) => Ok(vec![DiffOp::RemoveRange {
                key: Key::Index(0),
                length: split_lines(text).len(),
            }]),
            _ => Err(MergeError::InvalidDecisionShape(
                "clear_parent on an atomic value".to_string(),
            )),
        },
    }
}

/// The single key both sides of a `Clear` decision target.
fn shared_target_key(decision: &MergeDecision) -> Result<Key, MergeError> {
    let mut shared: Option<&Key> = None;
    for op in decision.local_diff.iter().chain(&decision.remote_diff) {
        match shared {
            None => shared = Some(op.key()),
            Some(k) if k == op.key() => {}
            Some(k) => {
                return Err(MergeError::InconsistentClearKey {
                    expected: k.clone(),
                    found: op.key().clone(),
                })
            }
        }
    }
    shared.cloned().ok_or_else(|| {
        MergeError::InvalidDecisionShape("clear action with no target key".to_string())
    })
}

// ── Path splitting at text nodes ──────────────────────────────────────────

/// Splits `path` into the part that addresses real document positions and
/// the trailing line offset, by walking `doc` and stopping at the first
/// string node. Line indices never exist as actual positions, so callers
/// must re-wrap the trailing part as a nested `Patch` on the string.
pub fn split_string_path(doc: &Value, path: &[Key]) -> Result<(Vec<Key>, Vec<Key>), MergeError> {
    let mut node = doc;
    for (i, key) in path.iter().enumerate() {
        if node.is_string() {
            return Ok((path[..i].to_vec(), path[i..].to_vec()));
        }
        node = get_at(node, std::slice::from_ref(key)).ok_or_else(|| {
            MergeError::PathResolution {
                path: path.to_vec(),
                key: key.clone(),
            }
        })?;
    }
    Ok((path.to_vec(), vec![]))
}

//! Path/diff normalization: moving shared nested-`Patch` prefixes between
//! a decision's `common_path` and the diffs stored under it.

use docmerge_diff::{DiffOp, Key};

use crate::types::{MergeAction, MergeDecision, MergeError};

/// A diff that may be absent. Absent diffs survive normalization as
/// placeholders so the inverse operation can recreate them in place.
pub type DiffSlot = Option<Vec<DiffOp>>;

// ── Deepening ─────────────────────────────────────────────────────────────

/// One deepen step: if every present diff is exactly one `Patch` op and
/// all of them target the same key, returns that key and the nested diffs
/// (absent and empty slots stay absent). Otherwise `None`.
pub(crate) fn pop_path(diffs: &[DiffSlot]) -> Option<(Key, Vec<DiffSlot>)> {
    let mut shared: Option<&Key> = None;
    let mut popped: Vec<DiffSlot> = Vec::with_capacity(diffs.len());
    for slot in diffs {
        let ops = match slot {
            None => {
                popped.push(None);
                continue;
            }
            Some(ops) if ops.is_empty() => {
                popped.push(None);
                continue;
            }
            Some(ops) => ops,
        };
        if ops.len() != 1 {
            return None;
        }
        let DiffOp::Patch { key, diff } = &ops[0] else {
            return None;
        };
        match shared {
            None => shared = Some(key),
            Some(k) if k == key => {}
            Some(_) => return None,
        }
        popped.push(Some(diff.clone()));
    }
    shared.map(|key| (key.clone(), popped))
}

/// Pops shared `Patch` layers off `diffs` into `path` until no further
/// layer can be removed, guaranteeing the deepest common path.
pub fn ensure_common_path(
    mut path: Vec<Key>,
    mut diffs: Vec<DiffSlot>,
) -> (Vec<Key>, Vec<DiffSlot>) {
    while let Some((key, popped)) = pop_path(&diffs) {
        path.push(key);
        diffs = popped;
    }
    (path, diffs)
}

/// Wraps `diffs` in one `Patch` layer per key of `prefix`, innermost key
/// last.
pub fn push_path(prefix: &[Key], diffs: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut diffs = diffs;
    for key in prefix.iter().rev() {
        diffs = vec![DiffOp::Patch {
            key: key.clone(),
            diff: diffs,
        }];
    }
    diffs
}

// ── Decision-level shifting ───────────────────────────────────────────────

fn present(ops: &[DiffOp]) -> DiffSlot {
    if ops.is_empty() {
        None
    } else {
        Some(ops.to_vec())
    }
}

/// Produces a new decision one level deeper in the diff tree, or `None`
/// when the diffs do not share a single outer `Patch` layer.
pub fn pop_patch_decision(decision: &MergeDecision) -> Option<MergeDecision> {
    let mut slots = vec![present(&decision.local_diff), present(&decision.remote_diff)];
    if decision.action == MergeAction::Custom {
        slots.push(decision.custom_diff.clone());
    }
    let (key, mut popped) = pop_path(&slots)?;
    let mut common_path = decision.common_path.clone();
    common_path.push(key);
    let custom_diff = if decision.action == MergeAction::Custom {
        popped.pop().flatten()
    } else {
        decision.custom_diff.clone()
    };
    let remote_diff = popped.pop().flatten().unwrap_or_default();
    let local_diff = popped.pop().flatten().unwrap_or_default();
    Some(MergeDecision {
        common_path,
        action: decision.action,
        local_diff,
        remote_diff,
        custom_diff,
        conflict: decision.conflict,
    })
}

/// Deepens a decision to a fixed point: the returned decision cannot have
/// another shared `Patch` layer popped off its diffs. Used to normalize
/// decisions coming from mismatched levels before comparison.
pub fn pop_all_patch_decisions(decision: MergeDecision) -> MergeDecision {
    let mut decision = decision;
    while let Some(popped) = pop_patch_decision(&decision) {
        decision = popped;
    }
    decision
}

/// Moves the trailing `prefix` of `common_path` back into the diffs by
/// wrapping each non-empty diff (custom included, when the action is
/// `Custom`) in nested `Patch` ops, innermost key first. Fails with
/// [`MergeError::PathUnderflow`] when the path is too short or a trailing
/// key does not match.
pub fn push_patch_decision(
    decision: &MergeDecision,
    prefix: &[Key],
) -> Result<MergeDecision, MergeError> {
    let mut out = decision.clone();
    for key in prefix.iter().rev() {
        match out.common_path.last() {
            None => {
                return Err(MergeError::PathUnderflow {
                    key: key.clone(),
                    path: decision.common_path.clone(),
                })
            }
            Some(last) if last != key => {
                return Err(MergeError::PathUnderflow {
                    key: key.clone(),
                    path: decision.common_path.clone(),
                })
            }
            Some(_) => {}
        }
        out.common_path.pop();
        if !out.local_diff.is_empty() {
            out.local_diff = push_path(std::slice::from_ref(key), std::mem::take(&mut out.local_diff));
        }
        if !out.remote_diff.is_empty() {
            out.remote_diff = push_path(std::slice::from_ref(key), std::mem::take(&mut out.remote_diff));
        }
        if out.action == MergeAction::Custom {
            if let Some(custom) = out.custom_diff.take() {
                if custom.is_empty() {
                    out.custom_diff = Some(custom);
                } else {
                    out.custom_diff = Some(push_path(std::slice::from_ref(key), custom));
                }
            }
        }
    }
    Ok(out)
}

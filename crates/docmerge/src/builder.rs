//! The sanctioned constructor for merge decisions.

use docmerge_diff::{DiffOp, Key};

use crate::normalize::ensure_common_path;
use crate::sort::sort_decisions;
use crate::types::{MergeAction, MergeDecision, MergeError};

/// Which side applies first for a sequential (both-sides) decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOrder {
    LocalFirst,
    RemoteFirst,
}

/// Accumulates decisions for one merge, one constructor per action family.
/// Each constructor checks its diff-shape precondition and normalizes the
/// path to the deepest level shared `Patch` layers allow before storing.
#[derive(Debug, Default)]
pub struct MergeDecisionBuilder {
    decisions: Vec<MergeDecision>,
}

impl MergeDecisionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    fn add(
        &mut self,
        path: Vec<Key>,
        action: MergeAction,
        local_diff: Option<Vec<DiffOp>>,
        remote_diff: Option<Vec<DiffOp>>,
        custom_diff: Option<Vec<DiffOp>>,
        conflict: bool,
    ) {
        let (common_path, mut slots) =
            ensure_common_path(path, vec![local_diff, remote_diff, custom_diff]);
        let custom_diff = slots.pop().flatten();
        let remote_diff = slots.pop().flatten().unwrap_or_default();
        let local_diff = slots.pop().flatten().unwrap_or_default();
        self.decisions.push(MergeDecision {
            common_path,
            action,
            local_diff,
            remote_diff,
            custom_diff,
            conflict,
        });
    }

    /// Keep the base value. Empty diffs record a pure no-op.
    pub fn keep(&mut self, path: Vec<Key>, local_diff: Vec<DiffOp>, remote_diff: Vec<DiffOp>) {
        self.add(
            path,
            MergeAction::Base,
            Some(local_diff),
            Some(remote_diff),
            None,
            false,
        );
    }

    /// Exactly one side edited the node; take that side.
    pub fn one_sided(
        &mut self,
        path: Vec<Key>,
        local_diff: Vec<DiffOp>,
        remote_diff: Vec<DiffOp>,
    ) -> Result<(), MergeError> {
        let action = match (local_diff.is_empty(), remote_diff.is_empty()) {
            (false, true) => MergeAction::Local,
            (true, false) => MergeAction::Remote,
            _ => {
                return Err(MergeError::InvalidDecisionShape(
                    "one_sided requires exactly one non-empty side".to_string(),
                ))
            }
        };
        self.add(path, action, Some(local_diff), Some(remote_diff), None, false);
        Ok(())
    }

    /// Both sides edited the node differently and both edits apply, in the
    /// given order.
    pub fn sequential(
        &mut self,
        path: Vec<Key>,
        local_diff: Vec<DiffOp>,
        remote_diff: Vec<DiffOp>,
        order: ApplyOrder,
        conflict: bool,
    ) -> Result<(), MergeError> {
        if local_diff.is_empty() || remote_diff.is_empty() {
            return Err(MergeError::InvalidDecisionShape(
                "sequential requires both sides non-empty".to_string(),
            ));
        }
        if local_diff == remote_diff {
            return Err(MergeError::InvalidDecisionShape(
                "sequential requires differing sides; use agree".to_string(),
            ));
        }
        let action = match order {
            ApplyOrder::LocalFirst => MergeAction::LocalThenRemote,
            ApplyOrder::RemoteFirst => MergeAction::RemoteThenLocal,
        };
        self.add(
            path,
            action,
            Some(local_diff),
            Some(remote_diff),
            None,
            conflict,
        );
        Ok(())
    }

    /// Both sides made the same edit.
    pub fn agree(
        &mut self,
        path: Vec<Key>,
        local_diff: Vec<DiffOp>,
        remote_diff: Vec<DiffOp>,
    ) -> Result<(), MergeError> {
        if local_diff.is_empty() || remote_diff.is_empty() {
            return Err(MergeError::InvalidDecisionShape(
                "agree requires both sides non-empty".to_string(),
            ));
        }
        if local_diff != remote_diff {
            return Err(MergeError::InvalidDecisionShape(
                "agree requires identical sides".to_string(),
            ));
        }
        self.add(
            path,
            MergeAction::Either,
            Some(local_diff),
            Some(remote_diff),
            None,
            false,
        );
        Ok(())
    }

    /// The sides diverge and no resolution was chosen: record the conflict
    /// and default to the base value.
    pub fn conflict(
        &mut self,
        path: Vec<Key>,
        local_diff: Vec<DiffOp>,
        remote_diff: Vec<DiffOp>,
    ) -> Result<(), MergeError> {
        if local_diff.is_empty() || remote_diff.is_empty() {
            return Err(MergeError::InvalidDecisionShape(
                "conflict requires both sides non-empty".to_string(),
            ));
        }
        if local_diff == remote_diff {
            return Err(MergeError::InvalidDecisionShape(
                "conflicting sides must differ; use agree".to_string(),
            ));
        }
        self.add(
            path,
            MergeAction::Base,
            Some(local_diff),
            Some(remote_diff),
            None,
            true,
        );
        Ok(())
    }

    /// A caller-supplied resolution overriding both sides.
    pub fn custom(
        &mut self,
        path: Vec<Key>,
        local_diff: Vec<DiffOp>,
        remote_diff: Vec<DiffOp>,
        custom_diff: Vec<DiffOp>,
        conflict: bool,
    ) -> Result<(), MergeError> {
        if custom_diff.is_empty() {
            return Err(MergeError::InvalidDecisionShape(
                "custom requires a non-empty custom_diff".to_string(),
            ));
        }
        self.add(
            path,
            MergeAction::Custom,
            Some(local_diff),
            Some(remote_diff),
            Some(custom_diff),
            conflict,
        );
        Ok(())
    }

    /// Returns all built decisions in application order (deepest paths
    /// first, stable for identical paths).
    pub fn finalize(mut self) -> Vec<MergeDecision> {
        sort_decisions(&mut self.decisions);
        self.decisions
    }
}

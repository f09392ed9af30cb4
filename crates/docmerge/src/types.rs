//! Merge decision records, action tags and the engine error taxonomy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use docmerge_diff::{DiffOp, Key, PatchError};

// ── Error ─────────────────────────────────────────────────────────────────

/// Every error is fatal: the engine is a pure, deterministic transform, so
/// a failure means a malformed decision or an out-of-sync base document,
/// never a transient condition. No partial output survives an error.
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("invalid decision shape: {0}")]
    InvalidDecisionShape(String),
    #[error("cannot strip key {key} from decision path {path:?}")]
    PathUnderflow { key: Key, path: Vec<Key> },
    #[error("unknown merge action: {0}")]
    UnknownAction(String),
    #[error("clear action targets inconsistent keys: {expected} vs {found}")]
    InconsistentClearKey { expected: Key, found: Key },
    #[error("cannot resolve key {key} while walking path {path:?}")]
    PathResolution { path: Vec<Key>, key: Key },
    #[error(transparent)]
    Patch(#[from] PatchError),
}

// ── Actions ───────────────────────────────────────────────────────────────

/// The tag selecting which side(s) of a decision's diffs to apply, or a
/// structural clear operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeAction {
    /// Keep the base value; with `conflict` set and non-empty diffs this
    /// records an unresolved conflict that defaults to base.
    Base,
    Local,
    Remote,
    /// Both sides made the same edit; either diff applies.
    Either,
    LocalThenRemote,
    RemoteThenLocal,
    /// Apply the decision's `custom_diff` instead of either side.
    Custom,
    /// Reset the targeted child to its type's empty form.
    Clear,
    /// Remove all children of the node at the decision path.
    ClearParent,
}

impl MergeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeAction::Base => "base",
            MergeAction::Local => "local",
            MergeAction::Remote => "remote",
            MergeAction::Either => "either",
            MergeAction::LocalThenRemote => "local_then_remote",
            MergeAction::RemoteThenLocal => "remote_then_local",
            MergeAction::Custom => "custom",
            MergeAction::Clear => "clear",
            MergeAction::ClearParent => "clear_parent",
        }
    }
}

impl FromStr for MergeAction {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, MergeError> {
        match s {
            "base" => Ok(MergeAction::Base),
            "local" => Ok(MergeAction::Local),
            "remote" => Ok(MergeAction::Remote),
            "either" => Ok(MergeAction::Either),
            "local_then_remote" => Ok(MergeAction::LocalThenRemote),
            "remote_then_local" => Ok(MergeAction::RemoteThenLocal),
            "custom" => Ok(MergeAction::Custom),
            "clear" => Ok(MergeAction::Clear),
            "clear_parent" => Ok(MergeAction::ClearParent),
            other => Err(MergeError::UnknownAction(other.to_string())),
        }
    }
}

// ── Decisions ─────────────────────────────────────────────────────────────

/// One statement of how to reconcile local and remote edits at one path.
///
/// `common_path` locates the node the decision concerns and is maximally
/// deep: any `Patch` layer shared by every present diff has been folded
/// into the path at construction. `local_diff`/`remote_diff` are relative
/// to that node; an empty list means the side is absent. `custom_diff`
/// accompanies `Custom` only.
///
/// Decisions are created by [`crate::MergeDecisionBuilder`] (or
/// deserialized from the generator) and consumed read-only; path shifting
/// produces new records rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeDecision {
    pub common_path: Vec<Key>,
    pub action: MergeAction,
    #[serde(default)]
    pub local_diff: Vec<DiffOp>,
    #[serde(default)]
    pub remote_diff: Vec<DiffOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_diff: Option<Vec<DiffOp>>,
    #[serde(default)]
    pub conflict: bool,
}

//! docmerge — three-way merge decision resolution and application.
//!
//! Sits between a diff/merge-decision generator (which compares a base
//! document against two modified variants and proposes, per sub-path, how
//! to reconcile them) and the final merged document. A decision list is
//! validated and path-normalized by [`MergeDecisionBuilder`], put into a
//! deterministic order by [`sort_decisions`], and then either folded into
//! one merged document by [`apply_decisions`] or projected back into a
//! single flat diff by [`build_diffs`].
//!
//! Documents are `serde_json::Value` trees; edits use the diff-op
//! vocabulary of the `docmerge-diff` crate.

pub mod apply;
pub mod builder;
pub mod normalize;
pub mod reassemble;
pub mod resolve;
pub mod sort;
pub mod types;

pub use apply::apply_decisions;
pub use builder::{ApplyOrder, MergeDecisionBuilder};
pub use docmerge_diff::{patch, DiffOp, Key, PatchError, Path};
pub use normalize::{
    ensure_common_path, pop_all_patch_decisions, pop_patch_decision, push_patch_decision,
    push_path,
};
pub use reassemble::{build_diffs, MergeSide};
pub use resolve::{make_cleared_value, resolve_action, split_string_path};
pub use sort::{cmp_paths, sort_decisions};
pub use types::{MergeAction, MergeDecision, MergeError};

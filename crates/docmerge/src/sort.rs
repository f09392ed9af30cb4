//! Deterministic ordering of merge decisions.
//!
//! Decisions are applied deepest-first so that tree mutations never
//! invalidate the paths of decisions still waiting to be applied: a child
//! is fully resolved before its ancestor's own edits run, and within one
//! sequence higher indices are edited before lower ones, so removals never
//! shift a not-yet-applied position.

use std::cmp::Ordering;

use docmerge_diff::Key;

use crate::types::MergeDecision;

/// Ascending order of a single path component: indices by value (so larger
/// indices come first once the full sort is reversed), names
/// lexicographically, indices before names. A mapping node and a sequence
/// node never share a container, so an index/name comparison at the same
/// depth only arises from a malformed decision list; the order stays total
/// regardless.
fn cmp_component(a: &Key, b: &Key) -> Ordering {
    match (a, b) {
        (Key::Index(x), Key::Index(y)) => x.cmp(y),
        (Key::Name(x), Key::Name(y)) => x.cmp(y),
        (Key::Index(_), Key::Name(_)) => Ordering::Less,
        (Key::Name(_), Key::Index(_)) => Ordering::Greater,
    }
}

/// Ascending path comparison; a strict prefix orders before its
/// extensions. [`sort_decisions`] reverses this, so extensions (deeper
/// paths) come first in the processing order.
pub fn cmp_paths(a: &[Key], b: &[Key]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match cmp_component(x, y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Stable descending sort by `common_path`; identical paths keep their
/// relative order.
pub fn sort_decisions(decisions: &mut [MergeDecision]) {
    decisions.sort_by(|a, b| cmp_paths(&b.common_path, &a.common_path));
}

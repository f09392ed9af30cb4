//! Projects a decision list back into one flat diff for a single side,
//! without touching the document.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

use docmerge_diff::{is_prefix, join_path, shared_prefix_len, DiffOp, Key};

use crate::normalize::push_path;
use crate::resolve::{resolve_action, split_string_path};
use crate::types::{MergeDecision, MergeError};

/// Which projection of the decision list to reconstruct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    Local,
    Remote,
    Merged,
}

struct TreeEntry {
    path: Vec<Key>,
    diff: Vec<DiffOp>,
}

/// Builds a single flat diff, rooted at the document root and directly
/// applicable to `base` via `patch`, equivalent to the edits `decisions`
/// make on the chosen side. For `Merged` each action is resolved exactly
/// as during application; for `Local`/`Remote` the raw side diffs are
/// taken. `decisions` must be in the order produced by
/// [`crate::sort_decisions`]. Returns `None` when the list contributes no
/// fragments at all.
pub fn build_diffs(
    base: &Value,
    decisions: &[MergeDecision],
    side: MergeSide,
) -> Result<Option<Vec<DiffOp>>, MergeError> {
    let mut tree: IndexMap<String, TreeEntry> = IndexMap::new();

    for decision in decisions {
        let (path, line) = split_string_path(base, &decision.common_path)?;
        let subdiffs = match side {
            MergeSide::Merged => {
                let node = resolve_node(base, &path)?;
                resolve_action(&node, decision)?
            }
            MergeSide::Local => decision.local_diff.clone(),
            MergeSide::Remote => decision.remote_diff.clone(),
        };
        if subdiffs.is_empty() {
            continue;
        }
        match tree.entry(join_path(&path)) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if line.is_empty() {
                    entry.diff.extend(subdiffs);
                } else {
                    // Fragments addressing the same line share one Patch
                    // wrapper instead of duplicating it.
                    let offset = &line[0];
                    let existing = entry.diff.iter_mut().find_map(|op| match op {
                        DiffOp::Patch { key, diff } if key == offset => Some(diff),
                        _ => None,
                    });
                    match existing {
                        Some(diff) => diff.extend(push_path(&line[1..], subdiffs)),
                        None => entry.diff.extend(push_path(&line, subdiffs)),
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let diff = push_path(&line, subdiffs);
                vacant.insert(TreeEntry { path, diff });
            }
        }
    }

    if tree.is_empty() {
        return Ok(None);
    }
    // A root entry guarantees the join always terminates at one diff.
    if !tree.contains_key("/") {
        tree.insert(
            "/".to_string(),
            TreeEntry {
                path: vec![],
                diff: vec![],
            },
        );
    }
    let paths: Vec<String> = tree.keys().cloned().collect();
    Ok(Some(merge_tree(&tree, &paths)))
}

fn resolve_node(doc: &Value, path: &[Key]) -> Result<Value, MergeError> {
    let mut node = doc;
    for key in path {
        node = docmerge_diff::get_at(node, std::slice::from_ref(key)).ok_or_else(|| {
            MergeError::PathResolution {
                path: path.to_vec(),
                key: key.clone(),
            }
        })?;
    }
    Ok(node.clone())
}

/// Joins per-path diff fragments from deepest to shallowest. While the
/// next (shallower) path stays a prefix of the current one, the trunk is
/// wrapped down to it and extended; when the tree branches, the remaining
/// paths are joined recursively and both trunks meet at their shared
/// prefix. The final entry is always the root, so the result is rooted at
/// the document root.
fn merge_tree(tree: &IndexMap<String, TreeEntry>, sorted_paths: &[String]) -> Vec<DiffOp> {
    let mut trunk: Vec<DiffOp> = Vec::new();
    let mut root: Option<Vec<Key>> = None;
    for i in 0..sorted_paths.len() {
        let entry = &tree[&sorted_paths[i]];
        let next_path: Option<Vec<Key>> = if i + 1 == sorted_paths.len() {
            root.clone()
        } else {
            Some(tree[&sorted_paths[i + 1]].path.clone())
        };
        trunk.extend(entry.diff.iter().cloned());
        match next_path {
            None => {}
            Some(next) if is_prefix(&next, &entry.path) => {
                trunk = push_path(&entry.path[next.len()..], trunk);
                root = Some(next);
            }
            Some(_) => {
                // Branched: close this trunk and join it with the rest at
                // the first shared prefix. The recursion exhausts the
                // remaining paths, ending at the root entry.
                let branch = merge_tree(tree, &sorted_paths[i + 1..]);
                let root_path = &tree[&sorted_paths[sorted_paths.len() - 1]].path;
                let shared = shared_prefix_len(&entry.path, root_path);
                let mut joined = push_path(&entry.path[shared..], trunk);
                joined.extend(push_path(&root_path[shared..], branch));
                return joined;
            }
        }
    }
    trunk
}

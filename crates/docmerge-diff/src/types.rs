//! Core types: path keys, diff operations, patch errors, path utilities.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    #[error("key not found: {0}")]
    MissingKey(String),
    #[error("key already present: {0}")]
    KeyExists(String),
    #[error("index out of bounds: {0}")]
    InvalidIndex(usize),
    #[error("operation does not apply to target type")]
    InvalidTarget,
    #[error("invalid operation: {0}")]
    InvalidOp(String),
}

// ── Path keys ─────────────────────────────────────────────────────────────

/// One step of a path into a document: a sequence index (also addressing
/// text lines) or a mapping key. Kept as an explicit two-variant type so
/// that ordering and dispatch never fall back to runtime type sniffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(s) => write!(f, "{s}"),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

/// A path from the document root to one node.
pub type Path = Vec<Key>;

// ── Diff ops ──────────────────────────────────────────────────────────────

/// One atomic edit instruction, addressed by a key (mapping) or index
/// (sequence / text line).
///
/// Serializes to the generator's wire shape:
/// `{"op": "patch", "key": "a", "diff": [...]}` and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DiffOp {
    Add {
        key: Key,
        value: Value,
    },
    Remove {
        key: Key,
    },
    Replace {
        key: Key,
        value: Value,
    },
    Patch {
        key: Key,
        diff: Vec<DiffOp>,
    },
    AddRange {
        key: Key,
        valuelist: Vec<Value>,
    },
    RemoveRange {
        key: Key,
        length: usize,
    },
}

impl DiffOp {
    /// The key or index this op addresses.
    pub fn key(&self) -> &Key {
        match self {
            DiffOp::Add { key, .. }
            | DiffOp::Remove { key }
            | DiffOp::Replace { key, .. }
            | DiffOp::Patch { key, .. }
            | DiffOp::AddRange { key, .. }
            | DiffOp::RemoveRange { key, .. } => key,
        }
    }
}

// ── Path utilities ────────────────────────────────────────────────────────

/// Immutable navigation to the value at `path`. Returns `None` when a key
/// or index is missing, or when the path tries to descend into a scalar
/// (including a string: line positions are not real document positions).
pub fn get_at<'a>(doc: &'a Value, path: &[Key]) -> Option<&'a Value> {
    let mut node = doc;
    for key in path {
        node = match (node, key) {
            (Value::Object(map), Key::Name(name)) => map.get(name)?,
            (Value::Array(items), Key::Index(index)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Replaces the value at `path` with `value`. An empty path replaces the
/// whole document.
pub fn set_at(doc: &mut Value, path: &[Key], value: Value) -> Result<(), PatchError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let mut node = doc;
    for key in &path[..path.len() - 1] {
        node = match (node, key) {
            (Value::Object(map), Key::Name(name)) => map
                .get_mut(name)
                .ok_or_else(|| PatchError::MissingKey(name.clone()))?,
            (Value::Array(items), Key::Index(index)) => items
                .get_mut(*index)
                .ok_or(PatchError::InvalidIndex(*index))?,
            _ => return Err(PatchError::InvalidTarget),
        };
    }
    match (node, &path[path.len() - 1]) {
        (Value::Object(map), Key::Name(name)) => {
            let slot = map
                .get_mut(name)
                .ok_or_else(|| PatchError::MissingKey(name.clone()))?;
            *slot = value;
        }
        (Value::Array(items), Key::Index(index)) => {
            let slot = items
                .get_mut(*index)
                .ok_or(PatchError::InvalidIndex(*index))?;
            *slot = value;
        }
        _ => return Err(PatchError::InvalidTarget),
    }
    Ok(())
}

/// Whether `prefix` is a (non-strict) prefix of `path`.
pub fn is_prefix(prefix: &[Key], path: &[Key]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}

/// Length of the longest shared prefix of two paths.
pub fn shared_prefix_len(a: &[Key], b: &[Key]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Joins a path into a "/"-separated string; the root path is `"/"`.
pub fn join_path(path: &[Key]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&key.to_string());
    }
    out
}

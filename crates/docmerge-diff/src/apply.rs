//! Applies an ordered diff-op list to one document node.

use serde_json::{Map, Value};

use crate::types::{DiffOp, Key, PatchError};

// ── Entry point ───────────────────────────────────────────────────────────

/// Applies `diff` to `node`, returning a new node.
///
/// Mappings take `Add`/`Remove`/`Replace`/`Patch` by key; sequences take
/// `AddRange`/`RemoveRange`/`Patch`/`Replace` by index, consumed in
/// ascending index order in a single forward pass. Strings are patched as
/// sequences of lines (terminators kept) and re-joined, so the document
/// never holds a split string. Any op addressing a missing key or index
/// fails.
pub fn patch(node: &Value, diff: &[DiffOp]) -> Result<Value, PatchError> {
    if diff.is_empty() {
        return Ok(node.clone());
    }
    match node {
        Value::Object(map) => patch_mapping(map, diff),
        Value::Array(items) => patch_sequence(items, diff).map(Value::Array),
        Value::String(text) => patch_text(text, diff),
        _ => Err(PatchError::InvalidTarget),
    }
}

// ── Mappings ──────────────────────────────────────────────────────────────

fn patch_mapping(map: &Map<String, Value>, diff: &[DiffOp]) -> Result<Value, PatchError> {
    let mut out = map.clone();
    for op in diff {
        let key = match op.key() {
            Key::Name(name) => name.clone(),
            Key::Index(index) => {
                return Err(PatchError::InvalidOp(format!(
                    "index {index} used on a mapping"
                )))
            }
        };
        match op {
            DiffOp::Add { value, .. } => {
                if out.contains_key(&key) {
                    return Err(PatchError::KeyExists(key));
                }
                out.insert(key, value.clone());
            }
            DiffOp::Remove { .. } => {
                out.shift_remove(&key)
                    .ok_or(PatchError::MissingKey(key))?;
            }
            DiffOp::Replace { value, .. } => {
                let slot = out.get_mut(&key).ok_or(PatchError::MissingKey(key))?;
                *slot = value.clone();
            }
            DiffOp::Patch { diff: nested, .. } => {
                let current = out.get(&key).ok_or(PatchError::MissingKey(key.clone()))?;
                let patched = patch(current, nested)?;
                out.insert(key, patched);
            }
            DiffOp::AddRange { .. } | DiffOp::RemoveRange { .. } => {
                return Err(PatchError::InvalidTarget)
            }
        }
    }
    Ok(Value::Object(out))
}

// ── Sequences ─────────────────────────────────────────────────────────────

fn op_index(op: &DiffOp, take: usize, len: usize) -> Result<usize, PatchError> {
    let index = match op.key() {
        Key::Index(index) => *index,
        Key::Name(name) => {
            return Err(PatchError::InvalidOp(format!(
                "key {name} used on a sequence"
            )))
        }
    };
    if index < take {
        return Err(PatchError::InvalidOp(format!(
            "op at index {index} addresses already-consumed input (at {take})"
        )));
    }
    if index > len {
        return Err(PatchError::InvalidIndex(index));
    }
    Ok(index)
}

fn patch_sequence(items: &[Value], diff: &[DiffOp]) -> Result<Vec<Value>, PatchError> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    let mut take = 0usize;
    for op in diff {
        let index = op_index(op, take, items.len())?;
        out.extend(items[take..index].iter().cloned());
        take = index;
        match op {
            DiffOp::AddRange { valuelist, .. } => {
                out.extend(valuelist.iter().cloned());
            }
            DiffOp::RemoveRange { length, .. } => {
                if index + length > items.len() {
                    return Err(PatchError::InvalidIndex(index + length));
                }
                take = index + length;
            }
            DiffOp::Patch { diff: nested, .. } => {
                if index >= items.len() {
                    return Err(PatchError::InvalidIndex(index));
                }
                out.push(patch(&items[index], nested)?);
                take = index + 1;
            }
            DiffOp::Replace { value, .. } => {
                if index >= items.len() {
                    return Err(PatchError::InvalidIndex(index));
                }
                out.push(value.clone());
                take = index + 1;
            }
            DiffOp::Add { .. } | DiffOp::Remove { .. } => return Err(PatchError::InvalidTarget),
        }
    }
    out.extend(items[take..].iter().cloned());
    Ok(out)
}

// ── Text ──────────────────────────────────────────────────────────────────

/// Splits a string into lines, keeping `\n` terminators, so that joining
/// the pieces reproduces the input exactly.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            out.push(text[start..=i].to_string());
            start = i + 1;
        }
    }
    if start < text.len() {
        out.push(text[start..].to_string());
    }
    out
}

fn patch_text(text: &str, diff: &[DiffOp]) -> Result<Value, PatchError> {
    let lines = split_lines(text);
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut take = 0usize;
    for op in diff {
        let index = op_index(op, take, lines.len())?;
        out.extend(lines[take..index].iter().cloned());
        take = index;
        match op {
            DiffOp::AddRange { valuelist, .. } => {
                for value in valuelist {
                    out.push(as_text(value)?);
                }
            }
            DiffOp::RemoveRange { length, .. } => {
                if index + length > lines.len() {
                    return Err(PatchError::InvalidIndex(index + length));
                }
                take = index + length;
            }
            DiffOp::Patch { diff: nested, .. } => {
                if index >= lines.len() {
                    return Err(PatchError::InvalidIndex(index));
                }
                out.push(patch_line(&lines[index], nested)?);
                take = index + 1;
            }
            DiffOp::Replace { value, .. } => {
                if index >= lines.len() {
                    return Err(PatchError::InvalidIndex(index));
                }
                out.push(as_text(value)?);
                take = index + 1;
            }
            DiffOp::Add { .. } | DiffOp::Remove { .. } => return Err(PatchError::InvalidTarget),
        }
    }
    out.extend(lines[take..].iter().cloned());
    Ok(Value::String(out.concat()))
}

/// Character-level patch of a single line. `AddRange` values are string
/// fragments spliced in as-is.
fn patch_line(line: &str, diff: &[DiffOp]) -> Result<String, PatchError> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut take = 0usize;
    for op in diff {
        let index = op_index(op, take, chars.len())?;
        out.extend(&chars[take..index]);
        take = index;
        match op {
            DiffOp::AddRange { valuelist, .. } => {
                for value in valuelist {
                    out.push_str(&as_text(value)?);
                }
            }
            DiffOp::RemoveRange { length, .. } => {
                if index + length > chars.len() {
                    return Err(PatchError::InvalidIndex(index + length));
                }
                take = index + length;
            }
            _ => return Err(PatchError::InvalidTarget),
        }
    }
    out.extend(&chars[take..]);
    Ok(out)
}

fn as_text(value: &Value) -> Result<String, PatchError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(PatchError::InvalidOp(format!(
            "expected string fragment, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name(s: &str) -> Key {
        Key::Name(s.to_string())
    }

    #[test]
    fn add_to_mapping() {
        let doc = json!({"a": 1});
        let out = patch(
            &doc,
            &[DiffOp::Add {
                key: name("b"),
                value: json!(2),
            }],
        )
        .unwrap();
        assert_eq!(out, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn add_existing_key_fails() {
        let doc = json!({"a": 1});
        let err = patch(
            &doc,
            &[DiffOp::Add {
                key: name("a"),
                value: json!(2),
            }],
        )
        .unwrap_err();
        assert_eq!(err, PatchError::KeyExists("a".to_string()));
    }

    #[test]
    fn remove_preserves_mapping_order() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        let out = patch(&doc, &[DiffOp::Remove { key: name("b") }]).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn replace_missing_key_fails() {
        let doc = json!({"a": 1});
        let err = patch(
            &doc,
            &[DiffOp::Replace {
                key: name("b"),
                value: json!(2),
            }],
        )
        .unwrap_err();
        assert_eq!(err, PatchError::MissingKey("b".to_string()));
    }

    #[test]
    fn nested_patch_recurses() {
        let doc = json!({"a": {"b": 1}});
        let out = patch(
            &doc,
            &[DiffOp::Patch {
                key: name("a"),
                diff: vec![DiffOp::Replace {
                    key: name("b"),
                    value: json!(9),
                }],
            }],
        )
        .unwrap();
        assert_eq!(out, json!({"a": {"b": 9}}));
    }

    #[test]
    fn sequence_addrange_and_removerange() {
        let doc = json!([1, 2, 3, 4]);
        let out = patch(
            &doc,
            &[
                DiffOp::AddRange {
                    key: Key::Index(1),
                    valuelist: vec![json!(10), json!(11)],
                },
                DiffOp::RemoveRange {
                    key: Key::Index(2),
                    length: 2,
                },
            ],
        )
        .unwrap();
        assert_eq!(out, json!([1, 10, 11, 2]));
    }

    #[test]
    fn sequence_replace_and_tail() {
        let doc = json!([1, 2, 3]);
        let out = patch(
            &doc,
            &[DiffOp::Replace {
                key: Key::Index(0),
                value: json!(0),
            }],
        )
        .unwrap();
        assert_eq!(out, json!([0, 2, 3]));
    }

    #[test]
    fn sequence_backwards_op_fails() {
        let doc = json!([1, 2, 3]);
        let err = patch(
            &doc,
            &[
                DiffOp::RemoveRange {
                    key: Key::Index(2),
                    length: 1,
                },
                DiffOp::RemoveRange {
                    key: Key::Index(0),
                    length: 1,
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::InvalidOp(_)));
    }

    #[test]
    fn split_lines_keeps_terminators() {
        assert_eq!(split_lines("x\ny\nz"), ["x\n", "y\n", "z"]);
        assert_eq!(split_lines("x\n"), ["x\n"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn text_line_replace() {
        let doc = json!("x\ny\nz");
        let out = patch(
            &doc,
            &[
                DiffOp::AddRange {
                    key: Key::Index(1),
                    valuelist: vec![json!("Y\n")],
                },
                DiffOp::RemoveRange {
                    key: Key::Index(1),
                    length: 1,
                },
            ],
        )
        .unwrap();
        assert_eq!(out, json!("x\nY\nz"));
    }

    #[test]
    fn text_character_patch_inside_line() {
        let doc = json!("x\ny\nz");
        let out = patch(
            &doc,
            &[DiffOp::Patch {
                key: Key::Index(1),
                diff: vec![
                    DiffOp::AddRange {
                        key: Key::Index(0),
                        valuelist: vec![json!("Y")],
                    },
                    DiffOp::RemoveRange {
                        key: Key::Index(0),
                        length: 1,
                    },
                ],
            }],
        )
        .unwrap();
        assert_eq!(out, json!("x\nY\nz"));
    }

    #[test]
    fn scalar_rejects_ops() {
        let doc = json!(42);
        let err = patch(
            &doc,
            &[DiffOp::Remove {
                key: name("a"),
            }],
        )
        .unwrap_err();
        assert_eq!(err, PatchError::InvalidTarget);
    }

    #[test]
    fn empty_diff_is_identity() {
        let doc = json!(42);
        assert_eq!(patch(&doc, &[]).unwrap(), doc);
    }
}

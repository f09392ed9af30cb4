//! Diff operations over hierarchical documents.
//!
//! A document is a `serde_json::Value` tree of mappings, sequences,
//! multi-line strings and scalars. This crate defines the diff-op
//! vocabulary used to describe edits to such a tree, a handful of path
//! utilities, and [`patch`], which applies an ordered diff-op list to one
//! node and returns the edited node.
//!
//! Strings are diffed as ordered sequences of lines (and lines as
//! sequences of characters), but a string is always stored as one scalar
//! value: [`patch`] splits, edits and re-joins it internally.

pub mod apply;
pub mod types;

pub use apply::{patch, split_lines};
pub use types::{
    get_at, is_prefix, join_path, set_at, shared_prefix_len, DiffOp, Key, PatchError, Path,
};

//! JSON Patch (RFC 6902) application.
//!
//! Documents are edited through an ordered sequence of operations addressed
//! by JSON Pointer (RFC 6901). Application is all-or-nothing: the input
//! document is never modified, and an error from any operation discards the
//! partially patched copy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single patch operation, in its wire shape (`{"op": "add", ...}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert a value at the path, replacing an existing object member or
    /// shifting array elements right.
    Add { path: String, value: Value },
    /// Remove the value at the path. The target must exist.
    Remove { path: String },
    /// Replace the value at the path. The target must exist.
    Replace { path: String, value: Value },
    /// Remove the value at `from` and add it at `path`.
    Move { from: String, path: String },
    /// Copy the value at `from` to `path`.
    Copy { from: String, path: String },
    /// Assert that the value at the path equals `value`.
    Test { path: String, value: Value },
}

/// Failure of a single patch operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid JSON pointer {0:?}")]
    InvalidPointer(String),

    #[error("path {0:?} does not exist")]
    PathNotFound(String),

    #[error("invalid array index in {0:?}")]
    InvalidIndex(String),

    #[error("test failed at {0:?}")]
    TestFailed(String),

    #[error("cannot move {from:?} into its own child {path:?}")]
    MoveIntoChild { from: String, path: String },
}

/// Apply an ordered sequence of operations to a document.
///
/// Pure function: the input is cloned up front, and the patched copy is
/// only returned when every operation succeeded.
pub fn apply(doc: &Value, ops: &[PatchOp]) -> Result<Value, PatchError> {
    let mut patched = doc.clone();
    for op in ops {
        apply_one(&mut patched, op)?;
    }
    Ok(patched)
}

fn apply_one(doc: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOp::Replace { path, value } => {
            let tokens = parse_pointer(path)?;
            let target = descend_mut(doc, &tokens, path)?;
            *target = value.clone();
            Ok(())
        }
        PatchOp::Move { from, path } => {
            if path.len() > from.len()
                && path.starts_with(from.as_str())
                && path.as_bytes()[from.len()] == b'/'
            {
                return Err(PatchError::MoveIntoChild {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOp::Copy { from, path } => {
            let tokens = parse_pointer(from)?;
            let value = descend(doc, &tokens, from)?.clone();
            add(doc, path, value)
        }
        PatchOp::Test { path, value } => {
            let tokens = parse_pointer(path)?;
            if descend(doc, &tokens, path)? == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed(path.clone()))
            }
        }
    }
}

/// Split a JSON Pointer into reference tokens, undoing `~1` and `~0`
/// escapes. The empty pointer refers to the whole document.
fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    }
    Ok(pointer[1..]
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Parse an array reference token. Leading zeros are rejected per RFC 6901.
fn parse_index(token: &str, pointer: &str) -> Result<usize, PatchError> {
    if token.is_empty()
        || (token.len() > 1 && token.starts_with('0'))
        || !token.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(PatchError::InvalidIndex(pointer.to_string()));
    }
    token
        .parse()
        .map_err(|_| PatchError::InvalidIndex(pointer.to_string()))
}

fn descend<'a>(doc: &'a Value, tokens: &[String], pointer: &str) -> Result<&'a Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get(token)
                .ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?,
            Value::Array(items) => {
                let index = parse_index(token, pointer)?;
                items
                    .get(index)
                    .ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            _ => return Err(PatchError::PathNotFound(pointer.to_string())),
        };
    }
    Ok(current)
}

fn descend_mut<'a>(
    doc: &'a mut Value,
    tokens: &[String],
    pointer: &str,
) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?,
            Value::Array(items) => {
                let index = parse_index(token, pointer)?;
                items
                    .get_mut(index)
                    .ok_or_else(|| PatchError::PathNotFound(pointer.to_string()))?
            }
            _ => return Err(PatchError::PathNotFound(pointer.to_string())),
        };
    }
    Ok(current)
}

fn add(doc: &mut Value, pointer: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse_pointer(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };

    let parent = descend_mut(doc, parents, pointer)?;
    match parent {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = if last.as_str() == "-" {
                items.len()
            } else {
                parse_index(last, pointer)?
            };
            if index > items.len() {
                return Err(PatchError::PathNotFound(pointer.to_string()));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(pointer.to_string())),
    }
}

fn remove(doc: &mut Value, pointer: &str) -> Result<Value, PatchError> {
    let tokens = parse_pointer(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        // Removing the document root is not a meaningful edit.
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    };

    let parent = descend_mut(doc, parents, pointer)?;
    match parent {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| PatchError::PathNotFound(pointer.to_string())),
        Value::Array(items) => {
            let index = parse_index(last, pointer)?;
            if index >= items.len() {
                return Err(PatchError::PathNotFound(pointer.to_string()));
            }
            Ok(items.remove(index))
        }
        _ => Err(PatchError::PathNotFound(pointer.to_string())),
    }
}

//! Flattening a document into an object keyed by normalized paths, and back.
//!
//! Every leaf (a scalar, an empty array or an empty object) becomes one member
//! whose key is the leaf's normalized path:
//!
//! ```
//! use json_query::{flatten, unflatten};
//! use serde_json::json;
//!
//! let doc = json!({"a": [1, {"b": null}], "c": {}});
//! let flat = flatten(&doc);
//! assert_eq!(flat, json!({"$['a'][0]": 1, "$['a'][1]['b']": null, "$['c']": {}}));
//! assert_eq!(unflatten(&flat).unwrap(), doc);
//! ```

use crate::document::Document;
use crate::error::UnflattenError;
use crate::location::{JsonLocation, PathElement};
use tracing::debug;

/// Map every leaf of `root` to its normalized path, in document order.
pub fn flatten<D: Document>(root: &D) -> D {
    let mut members = Vec::new();
    flatten_into(&JsonLocation::root(), root, &mut members);
    debug!(leaves = members.len(), "flattened document");
    D::from_members(members)
}

fn flatten_into<D: Document>(location: &JsonLocation, value: &D, out: &mut Vec<(String, D)>) {
    if value.is_array() && value.size() > 0 {
        for (i, element) in value.elements().enumerate() {
            flatten_into(&location.child(PathElement::Index(i)), element, out);
        }
    } else if value.is_object() && value.size() > 0 {
        for (name, member) in value.members() {
            flatten_into(&location.child(PathElement::Name(name.to_string())), member, out);
        }
    } else {
        out.push((location.to_string(), value.clone()));
    }
}

/// Rebuild a document from the output of [`flatten`].
///
/// Keys are parsed as normalized paths. Index steps create arrays and name
/// steps create objects. Array elements must appear in order: a key may
/// address an existing element or the next one, never one further out.
pub fn unflatten<D: Document>(flat: &D) -> Result<D, UnflattenError> {
    if !flat.is_object() {
        return Err(UnflattenError::NotAnObject);
    }
    let mut root = D::null();
    for (key, value) in flat.members() {
        let location = JsonLocation::parse(key).map_err(|source| UnflattenError::InvalidPath {
            key: key.to_string(),
            source,
        })?;
        place(&mut root, location.elements(), value.clone(), key)?;
    }
    debug!(leaves = flat.size(), "unflattened document");
    Ok(root)
}

/// Store `value` at `path` below `slot`, creating containers on the way. A
/// `null` slot has not been written yet.
fn place<D: Document>(slot: &mut D, path: &[PathElement], value: D, key: &str) -> Result<(), UnflattenError> {
    let conflict = || UnflattenError::Conflict { key: key.to_string() };
    let Some((first, rest)) = path.split_first() else {
        if !slot.is_null() {
            return Err(conflict());
        }
        *slot = value;
        return Ok(());
    };
    let child = match first {
        PathElement::Name(name) => {
            if slot.is_null() {
                *slot = D::from_members(Vec::new());
            }
            if !slot.is_object() {
                return Err(conflict());
            }
            if slot.member(name).is_none() {
                slot.insert_member(name.clone(), D::null());
            }
            slot.member_mut(name)
        }
        PathElement::Index(index) => {
            if slot.is_null() {
                *slot = D::from_array(Vec::new());
            }
            if !slot.is_array() {
                return Err(conflict());
            }
            if *index > slot.size() {
                return Err(UnflattenError::IndexGap { key: key.to_string() });
            }
            if *index == slot.size() {
                slot.push_element(D::null());
            }
            slot.element_mut(*index)
        }
    };
    match child {
        Some(child) => place(child, rest, value, key),
        None => Err(conflict()),
    }
}

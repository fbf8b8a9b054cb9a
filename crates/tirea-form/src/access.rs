//! Path accessor: read and write plain nested values by field path.
//!
//! Writes never fail. Missing intermediates are created (an array when the
//! next segment is an index, an object otherwise), scalars standing in the way
//! are replaced, and writing past the end of an array pads it with `null`
//! holes.
//!
//! The owned entry points ([`write`]) consume the root and hand it back, so
//! every subtree off the written path is moved rather than copied.

use crate::path::{parse_path, Path, Seg, MAX_INDEX};
use serde_json::{Map, Value};
use tracing::warn;

/// Get a reference to a value at a path.
///
/// Reading through a missing or mistyped intermediate returns `None`.
pub fn get_at_path<'a>(doc: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = doc;
    for seg in path {
        current = match seg {
            Seg::Key(key) => current.as_object()?.get(key)?,
            Seg::Index(idx) => current.as_array()?.get(*idx)?,
        };
    }
    Some(current)
}

/// Read a value at a string path.
///
/// An unparseable path reads as absent.
pub fn read<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let path = parse_path(path).ok()?;
    get_at_path(doc, &path)
}

/// Set a value at a path, creating intermediate containers as needed.
///
/// An index above [`MAX_INDEX`] skips the write instead of growing the array.
pub fn set_at_path(doc: &mut Value, path: &Path, value: Value) {
    set_segments(doc, path.segments(), value);
}

fn set_segments(current: &mut Value, segments: &[Seg], value: Value) {
    let Some((seg, rest)) = segments.split_first() else {
        *current = value;
        return;
    };

    match seg {
        Seg::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(obj) = current else {
                return;
            };
            if rest.is_empty() {
                obj.insert(key.clone(), value);
            } else {
                let child = obj
                    .entry(key.clone())
                    .or_insert_with(|| empty_container_for(rest));
                set_segments(child, rest, value);
            }
        }
        Seg::Index(idx) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let Value::Array(arr) = current else {
                return;
            };
            let Some(len) = idx.checked_add(1).filter(|len| *len <= MAX_INDEX + 1) else {
                warn!(index = *idx, max = MAX_INDEX, "skipping write past the array index limit");
                return;
            };
            if len > arr.len() {
                arr.resize(len, Value::Null);
            }
            set_segments(&mut arr[*idx], rest, value);
        }
    }
}

fn empty_container_for(rest: &[Seg]) -> Value {
    match rest.first() {
        Some(Seg::Index(_)) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// Delete the value at a path. Returns true if something was removed.
///
/// Object keys are removed outright. Array elements become `null` holes so
/// later indices keep their positions.
pub fn delete_at_path(doc: &mut Value, path: &Path) -> bool {
    let Some((last, parents)) = path.segments().split_last() else {
        return false;
    };

    let mut current = doc;
    for seg in parents {
        let next = match seg {
            Seg::Key(key) => current.as_object_mut().and_then(|obj| obj.get_mut(key)),
            Seg::Index(idx) => current.as_array_mut().and_then(|arr| arr.get_mut(*idx)),
        };
        match next {
            Some(child) => current = child,
            None => return false,
        }
    }

    match last {
        Seg::Key(key) => current
            .as_object_mut()
            .is_some_and(|obj| obj.remove(key).is_some()),
        Seg::Index(idx) => match current.as_array_mut().and_then(|arr| arr.get_mut(*idx)) {
            Some(slot) => {
                *slot = Value::Null;
                true
            }
            None => false,
        },
    }
}

/// Write (or, with `None`, delete) a value at a path and return the new root.
///
/// # Examples
///
/// ```
/// use tirea_form::{access, path};
/// use serde_json::json;
///
/// let doc = access::write(json!({}), &path!("items", 2usize, "name"), Some(json!("Lego")));
/// assert_eq!(doc, json!({"items": [null, null, {"name": "Lego"}]}));
///
/// let doc = access::write(doc, &path!("items", 2usize, "name"), None);
/// assert_eq!(doc, json!({"items": [null, null, {}]}));
/// ```
pub fn write(mut root: Value, path: &Path, value: Option<Value>) -> Value {
    match value {
        Some(value) => set_at_path(&mut root, path, value),
        None => {
            delete_at_path(&mut root, path);
        }
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    #[test]
    fn test_get_at_path() {
        let doc = json!({"a": {"b": [{"c": 42}]}});
        assert_eq!(get_at_path(&doc, &path!("a", "b", 0usize, "c")), Some(&json!(42)));
        assert_eq!(get_at_path(&doc, &path!("a", "x", "y")), None);
        assert_eq!(get_at_path(&doc, &path!("a", "b", 3usize)), None);
        // Indexing into an object is a miss, not a failure.
        assert_eq!(get_at_path(&doc, &path!("a", 0usize)), None);
    }

    #[test]
    fn test_read_string_path() {
        let doc = json!({"items": [{"name": "Lego"}]});
        assert_eq!(read(&doc, "items[0].name"), Some(&json!("Lego")));
        assert_eq!(read(&doc, "items[0"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut doc = json!({});
        set_at_path(&mut doc, &path!("shipping", "street"), json!("Yuhang road"));
        set_at_path(&mut doc, &path!("items", 0usize, "amount"), json!(10));
        assert_eq!(
            doc,
            json!({"shipping": {"street": "Yuhang road"}, "items": [{"amount": 10}]})
        );
    }

    #[test]
    fn test_set_sparse_index_leaves_holes() {
        let mut doc = json!({"list": []});
        set_at_path(&mut doc, &path!("list", 5usize), json!("x"));
        let list = doc["list"].as_array().unwrap();
        assert_eq!(list.len(), 6);
        assert!(list[..5].iter().all(Value::is_null));
        assert_eq!(list[5], "x");
    }

    #[test]
    fn test_set_replaces_scalar_in_the_way() {
        let mut doc = json!({"a": 1});
        set_at_path(&mut doc, &path!("a", "b"), json!(2));
        assert_eq!(doc, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_delete_key_and_index() {
        let mut doc = json!({"a": {"b": 1, "c": 2}, "list": [1, 2, 3]});
        assert!(delete_at_path(&mut doc, &path!("a", "b")));
        assert!(delete_at_path(&mut doc, &path!("list", 1usize)));
        assert!(!delete_at_path(&mut doc, &path!("missing", "x")));
        assert_eq!(doc, json!({"a": {"c": 2}, "list": [1, null, 3]}));
    }

    #[test]
    fn test_write_leaves_siblings_intact() {
        let doc = json!({"a": {"x": [1, 2]}, "b": {"y": true}});
        let out = write(doc, &path!("a", "z"), Some(json!("new")));
        assert_eq!(out, json!({"a": {"x": [1, 2], "z": "new"}, "b": {"y": true}}));
    }

    #[test]
    fn test_set_index_past_limit_is_skipped() {
        let mut doc = json!({"a": 1});
        set_at_path(&mut doc, &path!("list", usize::MAX), json!("x"));
        set_at_path(&mut doc, &path!("other", MAX_INDEX + 1, "name"), json!("y"));
        assert_eq!(doc, json!({"a": 1, "list": [], "other": []}));

        set_at_path(&mut doc, &path!("edge", MAX_INDEX), json!(true));
        assert_eq!(doc["edge"].as_array().map(Vec::len), Some(MAX_INDEX + 1));
    }

    #[test]
    fn test_read_huge_index_is_absent() {
        let doc = json!({"a": [1]});
        assert_eq!(read(&doc, "a[18446744073709551615]"), None);
        assert_eq!(get_at_path(&doc, &path!("a", usize::MAX)), None);
    }
}

//! Per-action transitions over a single form slice.
//!
//! Each transition is a pure function `(slice, payload) -> slice`. A
//! transition copies the slice header, rewrites only the records it addresses
//! and returns the input pointer untouched when it has nothing to do.

use crate::access::{get_at_path, set_at_path};
use crate::action::{ActionKind, ErrorMap};
use crate::field::FieldRecord;
use crate::path::{parse_path, Path};
use crate::slice::{is_reserved_key, FormSlice, ERROR_KEY};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Apply the transition for `kind` to `slice`.
///
/// DESTROY and unrecognised kinds return `slice` itself; destruction is
/// handled by the dispatch root since it removes the slice altogether.
pub fn transition(slice: &Arc<FormSlice>, kind: &ActionKind) -> Arc<FormSlice> {
    match kind {
        ActionKind::Blur {
            field,
            value,
            touch,
        } => blur(slice, field, value.as_ref(), *touch),
        ActionKind::Change {
            field,
            value,
            touch,
        } => change(slice, field, value, *touch),
        ActionKind::Focus { field } => focus(slice, field),
        ActionKind::Initialize { values, fields, .. } => {
            initialize(slice, values, fields.as_deref())
        }
        ActionKind::Reset => reset(slice),
        ActionKind::StartAsyncValidation => set_meta(slice, |s| s.async_validating = true),
        ActionKind::StopAsyncValidation { errors } => stop_async_validation(slice, errors.as_ref()),
        ActionKind::StartSubmit => set_meta(slice, |s| s.submitting = true),
        ActionKind::StopSubmit { errors } => stop_submit(slice, errors.as_ref()),
        ActionKind::Touch { fields } => set_touched(slice, fields, true),
        ActionKind::Untouch { fields } => set_touched(slice, fields, false),
        ActionKind::Destroy | ActionKind::Other => Arc::clone(slice),
    }
}

fn rejects_reserved(field: &str, kind: &'static str) -> bool {
    if is_reserved_key(field) {
        warn!(field, action = kind, "ignoring reserved field path");
        return true;
    }
    false
}

fn set_meta(slice: &Arc<FormSlice>, f: impl FnOnce(&mut FormSlice)) -> Arc<FormSlice> {
    let mut next = (**slice).clone();
    f(&mut next);
    Arc::new(next)
}

/// BLUR: store the value (unless none was supplied), merge the touch flag and
/// clear focus.
pub fn blur(slice: &Arc<FormSlice>, field: &str, value: Option<&Value>, touch: bool) -> Arc<FormSlice> {
    if rejects_reserved(field, "BLUR") {
        return Arc::clone(slice);
    }
    let mut next = (**slice).clone();
    next.update_field(field, |rec| {
        if let Some(value) = value {
            rec.value = Some(value.clone());
        }
        rec.touched = Some(touch || rec.is_touched());
    });
    next.active = None;
    Arc::new(next)
}

/// CHANGE: store the value and merge the touch flag. With touch requested the
/// field's async and submit errors are reset to `null`.
pub fn change(slice: &Arc<FormSlice>, field: &str, value: &Value, touch: bool) -> Arc<FormSlice> {
    if rejects_reserved(field, "CHANGE") {
        return Arc::clone(slice);
    }
    let mut next = (**slice).clone();
    next.update_field(field, |rec| {
        rec.value = Some(value.clone());
        rec.touched = Some(touch || rec.is_touched());
        if touch {
            rec.async_error = Some(Value::Null);
            rec.submit_error = Some(Value::Null);
        }
    });
    Arc::new(next)
}

/// FOCUS: mark the field visited and make it the active field.
pub fn focus(slice: &Arc<FormSlice>, field: &str) -> Arc<FormSlice> {
    if rejects_reserved(field, "FOCUS") {
        return Arc::clone(slice);
    }
    let mut next = (**slice).clone();
    next.update_field(field, |rec| rec.visited = Some(true));
    next.active = Some(field.to_owned());
    Arc::new(next)
}

/// INITIALIZE: replace every field record with `{initial: v, value: v}`.
///
/// Values are read from `values` through the explicit field list, or through
/// [`flatten_values`] when no list is given. Metadata other than `_active` is
/// kept.
pub fn initialize(slice: &Arc<FormSlice>, values: &Value, fields: Option<&[String]>) -> Arc<FormSlice> {
    let entries: Vec<(String, Option<Value>)> = match fields {
        Some(fields) => fields
            .iter()
            .filter(|field| !rejects_reserved(field, "INITIALIZE"))
            .map(|field| {
                let initial = match parse_path(field) {
                    Ok(path) => get_at_path(values, &path).cloned(),
                    Err(error) => {
                        warn!(field = field.as_str(), %error, "unparseable field path in INITIALIZE");
                        None
                    }
                };
                (field.clone(), initial)
            })
            .collect(),
        None => flatten_values(values)
            .into_iter()
            .map(|(path, value)| (path.to_string(), Some(value)))
            .filter(|(field, _)| !rejects_reserved(field, "INITIALIZE"))
            .collect(),
    };

    let mut next = (**slice).clone();
    next.replace_fields(
        entries
            .into_iter()
            .map(|(path, initial)| (path, Arc::new(FieldRecord::initialized(initial))))
            .collect(),
    );
    next.active = None;
    Arc::new(next)
}

/// Flatten a value tree into `(path, leaf)` pairs.
///
/// Objects recurse by key and arrays by index. Scalars and empty containers
/// are leaves, so projecting the pairs back yields the original tree. A
/// non-object root has no field paths.
///
/// Keys containing `.`, `[` or `]` cannot be told apart from nesting once
/// rendered as a field path, so they do not round-trip through
/// [`crate::get_values`]. They are kept as is and logged.
pub fn flatten_values(values: &Value) -> Vec<(Path, Value)> {
    fn walk(value: &Value, path: Path, out: &mut Vec<(Path, Value)>) {
        match value {
            Value::Object(obj) if !obj.is_empty() => {
                for (k, v) in obj {
                    warn_on_delimiters(k);
                    walk(v, path.clone().key(k.as_str()), out);
                }
            }
            Value::Array(arr) if !arr.is_empty() => {
                for (i, v) in arr.iter().enumerate() {
                    walk(v, path.clone().index(i), out);
                }
            }
            leaf => out.push((path, leaf.clone())),
        }
    }

    let mut out = Vec::new();
    if let Value::Object(obj) = values {
        for (k, v) in obj {
            warn_on_delimiters(k);
            walk(v, Path::root().key(k.as_str()), &mut out);
        }
    }
    out
}

fn warn_on_delimiters(key: &str) {
    if key.contains(['.', '[', ']']) {
        warn!(key, "value key contains a path delimiter and will not round-trip");
    }
}

/// RESET: collapse every initialized record to `{initial, value: initial}`,
/// drop records without an initial value and clear focus.
///
/// Records already in collapsed form keep their pointer, so a second reset
/// changes nothing.
pub fn reset(slice: &Arc<FormSlice>) -> Arc<FormSlice> {
    let mut next = (**slice).clone();
    let fields: BTreeMap<String, Arc<FieldRecord>> = next
        .take_fields()
        .into_iter()
        .filter_map(|(path, rec)| {
            if rec.is_reset() {
                return Some((path, rec));
            }
            let initial = rec.initial.clone()?;
            Some((path, Arc::new(FieldRecord::initialized(Some(initial)))))
        })
        .collect();
    next.replace_fields(fields);
    next.active = None;
    Arc::new(next)
}

/// Look up the error for `field` in an error payload.
///
/// A flat key wins; otherwise the payload is treated as a nested tree shaped
/// like the form values.
fn error_for(errors: &ErrorMap, field: &str) -> Option<Value> {
    if let Some(err) = errors.get(field) {
        return Some(err.clone());
    }
    let path = parse_path(field).ok()?;
    if path.len() < 2 {
        return None;
    }
    let (first, rest) = path.segments().split_first()?;
    let root = errors.get(first.as_key()?)?;
    get_at_path(root, &rest.iter().cloned().collect()).cloned()
}

/// STOP_ASYNC_VALIDATION: clear the in-flight flag and replace every field's
/// `asyncError` with the payload's entry, removing the attribute where the
/// payload has none. A reserved `_error` entry sets the form error; without
/// one the form error is left alone.
pub fn stop_async_validation(slice: &Arc<FormSlice>, errors: Option<&ErrorMap>) -> Arc<FormSlice> {
    let empty = Map::new();
    let errors = errors.unwrap_or(&empty);

    let mut next = (**slice).clone();
    next.async_validating = false;
    next.update_fields_where(
        |path, rec| rec.async_error != error_for(errors, path),
        |path, rec| rec.async_error = error_for(errors, path),
    );
    if let Some(form_error) = errors.get(ERROR_KEY) {
        next.error = Some(form_error.clone());
    }
    Arc::new(next)
}

/// STOP_SUBMIT: clear the in-flight flag.
///
/// Without a payload the submission succeeded: `_submitFailed` clears and
/// every `submitError` is removed. With a payload the submission failed:
/// `_submitFailed` is set, each field named in the payload gets its
/// `submitError`, stale submit errors on other fields are removed and a
/// reserved `_error` entry sets the form error.
pub fn stop_submit(slice: &Arc<FormSlice>, errors: Option<&ErrorMap>) -> Arc<FormSlice> {
    let mut next = (**slice).clone();
    next.submitting = false;

    let Some(errors) = errors else {
        next.submit_failed = false;
        next.update_fields_where(
            |_, rec| rec.submit_error.is_some(),
            |_, rec| rec.submit_error = None,
        );
        return Arc::new(next);
    };

    next.submit_failed = true;
    next.update_fields_where(
        |path, rec| rec.submit_error != error_for(errors, path),
        |path, rec| rec.submit_error = error_for(errors, path),
    );
    // Entries naming fields the form has not seen yet create them, unless the
    // entry is the root of a nested error tree for existing fields.
    let unseen: Vec<(&String, &Value)> = errors
        .iter()
        .filter(|(field, _)| {
            !is_reserved_key(field) && next.field(field).is_none() && !has_nested_fields(&next, field)
        })
        .collect();
    for (field, err) in unseen {
        next.update_field(field, |rec| rec.submit_error = Some(err.clone()));
    }
    if let Some(form_error) = errors.get(ERROR_KEY) {
        next.error = Some(form_error.clone());
    }
    Arc::new(next)
}

fn has_nested_fields(slice: &FormSlice, field: &str) -> bool {
    let Ok(ancestor) = parse_path(field) else {
        return false;
    };
    slice
        .fields()
        .filter_map(|(path, _)| parse_path(path).ok())
        .any(|path| path.is_nested_in(&ancestor))
}

/// TOUCH / UNTOUCH: set `touched` on each listed field.
pub fn set_touched(slice: &Arc<FormSlice>, fields: &[String], touched: bool) -> Arc<FormSlice> {
    let kind = if touched { "TOUCH" } else { "UNTOUCH" };
    let mut next = (**slice).clone();
    for field in fields {
        if rejects_reserved(field, kind) {
            continue;
        }
        if next.field(field).and_then(|rec| rec.touched) != Some(touched) {
            next.update_field(field, |rec| rec.touched = Some(touched));
        }
    }
    Arc::new(next)
}

/// Write `value` into the `value` attribute of `field`, leaving the record
/// untouched when it already holds that value.
pub(crate) fn write_value(slice: &mut FormSlice, field: &str, value: Option<Value>) {
    if slice.field(field).map(|rec| &rec.value) == Some(&value) {
        return;
    }
    if value.is_none() && slice.field(field).is_none() {
        return;
    }
    slice.update_field(field, |rec| rec.value = value);
}

/// Rebuild a nested tree from an error payload keyed by field path.
///
/// Useful for rendering: `{"items[0].name": "Required"}` becomes
/// `{"items": [{"name": "Required"}]}`. Reserved keys are skipped.
pub fn nest_errors(errors: &ErrorMap) -> Value {
    let mut out = Value::Object(Map::new());
    for (field, err) in errors {
        if is_reserved_key(field) {
            continue;
        }
        match parse_path(field) {
            Ok(path) => set_at_path(&mut out, &path, err.clone()),
            Err(error) => {
                warn!(field = field.as_str(), %error, "unparseable field path in error payload");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn errors(v: Value) -> ErrorMap {
        match v {
            Value::Object(map) => map,
            _ => panic!("errors fixture must be an object"),
        }
    }

    #[test]
    fn test_flatten_values_covers_nested_tree() {
        let flat = flatten_values(&json!({
            "name": "Meck",
            "shipping": {"street": "Yuhang road"},
            "items": [{"name": "Lego", "amount": 10}],
            "tags": []
        }));
        let paths: Vec<String> = flat.iter().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            paths,
            vec!["items[0].amount", "items[0].name", "name", "shipping.street", "tags"]
        );
        assert_eq!(flat[4].1, json!([]));
    }

    #[test]
    fn test_error_for_prefers_flat_key() {
        let e = errors(json!({"items[0].name": "flat", "items": [{"name": "nested"}]}));
        assert_eq!(error_for(&e, "items[0].name"), Some(json!("flat")));

        let e = errors(json!({"items": [{"name": "nested"}]}));
        assert_eq!(error_for(&e, "items[0].name"), Some(json!("nested")));
        assert_eq!(error_for(&e, "items[1].name"), None);
    }

    #[test]
    fn test_reserved_field_ignored() {
        let slice = Arc::new(FormSlice::new());
        let next = blur(&slice, "_active", Some(&json!("x")), true);
        assert!(Arc::ptr_eq(&slice, &next));
    }

    #[test]
    fn test_touch_skips_unchanged_records() {
        let slice = Arc::new(FormSlice::new().with_field(
            "a",
            FieldRecord {
                touched: Some(true),
                ..FieldRecord::default()
            },
        ));
        let next = set_touched(&slice, &["a".to_owned()], true);
        assert!(Arc::ptr_eq(slice.field("a").unwrap(), next.field("a").unwrap()));
    }

    #[test]
    fn test_nest_errors() {
        let e = errors(json!({"items[0].name": "Required", "name": "Short", "_error": "Bad"}));
        assert_eq!(
            nest_errors(&e),
            json!({"items": [{"name": "Required"}], "name": "Short"})
        );
    }

    #[test]
    fn test_initialize_skips_reserved_flattened_keys() {
        let slice = Arc::new(FormSlice::new());
        let next = initialize(&slice, &json!({"_error": "boom", "name": "a"}), None);
        assert!(next.field("_error").is_none());
        assert_eq!(next.error, None);
        assert_eq!(next.values(), json!({"name": "a"}));
        assert_eq!(
            serde_json::to_value(&*next).unwrap(),
            json!({
                "name": {"initial": "a", "value": "a"},
                "_asyncValidating": false,
                "_submitting": false,
                "_submitFailed": false
            })
        );
    }

    #[test]
    fn test_flatten_keeps_delimited_keys_verbatim() {
        let flat = flatten_values(&json!({"a.b": 1}));
        assert_eq!(flat, vec![(Path::root().key("a.b"), json!(1))]);
        assert_eq!(flat[0].0.to_string(), "a.b");
    }
}

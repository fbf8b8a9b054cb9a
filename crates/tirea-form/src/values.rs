//! Projection from field records back to the plain value tree.

use crate::access::set_at_path;
use crate::path::{parse_path, Path};
use crate::slice::FormSlice;
use serde_json::{Map, Value};
use tracing::warn;

/// Reconstruct the nested value tree of a form.
///
/// Every field with a `value` is written at its path, so `items[0].name`
/// produces a real array of objects. Fields without a value are omitted and
/// metadata never appears. A key that does not parse as a path is written as
/// a single literal key.
///
/// # Examples
///
/// ```
/// use tirea_form::{get_values, FieldRecord, FormSlice};
/// use serde_json::json;
///
/// let slice = FormSlice::new()
///     .with_field("a", FieldRecord::with_value(json!(1)))
///     .with_field("items[0].name", FieldRecord::with_value(json!("Lego")));
/// assert_eq!(get_values(&slice), json!({"a": 1, "items": [{"name": "Lego"}]}));
/// ```
pub fn get_values(slice: &FormSlice) -> Value {
    let mut out = Value::Object(Map::new());
    for (field, rec) in slice.fields() {
        let Some(value) = &rec.value else {
            continue;
        };
        let path = parse_path(field).unwrap_or_else(|error| {
            warn!(field, %error, "projecting unparseable field path as a literal key");
            Path::root().key(field)
        });
        set_at_path(&mut out, &path, value.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldRecord;
    use serde_json::json;

    #[test]
    fn test_skips_fields_without_value() {
        let slice = FormSlice::new()
            .with_field("a", FieldRecord::with_value(json!(1)))
            .with_field(
                "b",
                FieldRecord {
                    touched: Some(true),
                    ..FieldRecord::default()
                },
            );
        assert_eq!(get_values(&slice), json!({"a": 1}));
    }

    #[test]
    fn test_explicit_null_is_kept() {
        let slice = FormSlice::new().with_field("a", FieldRecord::with_value(Value::Null));
        assert_eq!(get_values(&slice), json!({"a": null}));
    }

    #[test]
    fn test_unparseable_key_is_literal() {
        let slice = FormSlice::new().with_field("odd[key", FieldRecord::with_value(json!(true)));
        assert_eq!(get_values(&slice), json!({"odd[key": true}));
    }

    #[test]
    fn test_empty_slice_projects_empty_object() {
        assert_eq!(get_values(&FormSlice::new()), json!({}));
    }

    #[test]
    fn test_huge_index_key_is_literal() {
        let slice = FormSlice::new()
            .with_field("a[18446744073709551615]", FieldRecord::with_value(json!(1)))
            .with_field("b[70000]", FieldRecord::with_value(json!(2)));
        assert_eq!(
            get_values(&slice),
            json!({"a[18446744073709551615]": 1, "b[70000]": 2})
        );
    }
}

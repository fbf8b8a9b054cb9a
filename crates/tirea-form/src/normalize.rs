//! Per-field normalizers that rewrite values after each dispatch.
//!
//! A normalizer sees the field's value after the inner reducer ran, its value
//! before the dispatch, and the projected value trees of the whole form
//! before and after. Its result is written into the field's `value` only when
//! it differs from what is there, so actions that do not move values leave
//! every record pointer-identical.

use crate::action::FormAction;
use crate::reducer::Reducer;
use crate::slice::{FormEntry, FormSlice, FormState};
use crate::transition::write_value;
use crate::values::get_values;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Normalizes one field's value.
pub trait FieldNormalizer: Send + Sync {
    fn normalize(
        &self,
        value: Option<&Value>,
        previous: Option<&Value>,
        all_values: &Value,
        previous_all_values: &Value,
    ) -> Option<Value>;
}

impl<F> FieldNormalizer for F
where
    F: Fn(Option<&Value>, Option<&Value>, &Value, &Value) -> Option<Value> + Send + Sync,
{
    fn normalize(
        &self,
        value: Option<&Value>,
        previous: Option<&Value>,
        all_values: &Value,
        previous_all_values: &Value,
    ) -> Option<Value> {
        self(value, previous, all_values, previous_all_values)
    }
}

/// Field path to normalizer, for one form.
pub type FieldNormalizers = BTreeMap<String, Arc<dyn FieldNormalizer>>;

/// Form name to its field normalizers.
pub type NormalizerMap = BTreeMap<String, FieldNormalizers>;

/// A reducer wrapped with per-field normalizers. Built by [`crate::ReducerExt::normalize`].
pub struct Normalized<R> {
    inner: R,
    normalizers: NormalizerMap,
}

impl<R> Normalized<R> {
    pub fn new(inner: R, normalizers: NormalizerMap) -> Self {
        Self { inner, normalizers }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Reducer> Reducer for Normalized<R> {
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState {
        let result = self.inner.reduce(state, action);
        self.normalizers
            .iter()
            .filter(|(form, _)| !action.destroys(form))
            .fold(result, |acc, (form, fields)| normalize_form(state, acc, form, fields))
    }
}

fn normalize_form(
    previous: &FormState,
    state: FormState,
    form: &str,
    fields: &FieldNormalizers,
) -> FormState {
    match state.entry(form) {
        Some(FormEntry::Keyed(instances)) => {
            let instances = instances.clone();
            instances.iter().fold(state, |acc, (key, slice)| {
                let before = previous.keyed_slice(form, key).map(|s| &**s);
                let next = normalize_slice(before, slice, fields);
                acc.with_keyed_slice(form, key, next)
            })
        }
        Some(FormEntry::Single(slice)) => {
            let next = normalize_slice(previous.slice(form).map(|s| &**s), slice, fields);
            state.with_slice(form, next)
        }
        None => {
            let slice = Arc::new(FormSlice::default());
            let next = normalize_slice(previous.slice(form).map(|s| &**s), &slice, fields);
            state.with_slice(form, next)
        }
    }
}

fn normalize_slice(
    before: Option<&FormSlice>,
    after: &Arc<FormSlice>,
    fields: &FieldNormalizers,
) -> Arc<FormSlice> {
    let previous_values = before.map(get_values).unwrap_or_else(empty_object);
    let values = get_values(after);

    let updates: Vec<(&str, Option<Value>)> = fields
        .iter()
        .filter_map(|(field, normalizer)| {
            let current = after.field(field).and_then(|rec| rec.value.as_ref());
            let previous = before
                .and_then(|slice| slice.field(field))
                .and_then(|rec| rec.value.as_ref());
            let normalized = normalizer.normalize(current, previous, &values, &previous_values);
            (normalized.as_ref() != current).then_some((field.as_str(), normalized))
        })
        .collect();

    if updates.is_empty() {
        return Arc::clone(after);
    }

    let mut next = (**after).clone();
    for (field, value) in updates {
        write_value(&mut next, field, value);
    }
    Arc::new(next)
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{FormReducer, ReducerExt};
    use serde_json::json;

    fn normalizers(form: &str, field: &str, n: impl FieldNormalizer + 'static) -> NormalizerMap {
        let mut fields = FieldNormalizers::new();
        fields.insert(field.to_owned(), Arc::new(n));
        let mut map = NormalizerMap::new();
        map.insert(form.to_owned(), fields);
        map
    }

    fn upper(value: Option<&Value>, _: Option<&Value>, _: &Value, _: &Value) -> Option<Value> {
        value
            .and_then(Value::as_str)
            .map(|s| Value::String(s.to_uppercase()))
    }

    #[test]
    fn test_constant_normalizer_shapes_initial_state() {
        let reducer = FormReducer.normalize(normalizers(
            "foo",
            "myField",
            |_: Option<&Value>, _: Option<&Value>, _: &Value, _: &Value| Some(json!("normalized")),
        ));
        let state = reducer.initial_state();
        let slice = state.slice("foo").unwrap();
        assert_eq!(slice.field("myField").unwrap().value, Some(json!("normalized")));
        assert!(!slice.submitting);
    }

    #[test]
    fn test_normalizes_changed_value() {
        let reducer = FormReducer.normalize(normalizers("foo", "code", upper));
        let state = reducer.reduce(
            &FormState::new(),
            &FormAction::change("code", json!("abc")).for_form("foo"),
        );
        assert_eq!(
            state.slice("foo").unwrap().field("code").unwrap().value,
            Some(json!("ABC"))
        );
    }

    #[test]
    fn test_non_value_action_keeps_records() {
        let reducer = FormReducer.normalize(normalizers("foo", "code", upper));
        let state = reducer.reduce(
            &FormState::new(),
            &FormAction::change("code", json!("abc")).for_form("foo"),
        );
        let next = reducer.reduce(&state, &FormAction::start_submit().for_form("foo"));
        assert!(Arc::ptr_eq(
            state.slice("foo").unwrap().field("code").unwrap(),
            next.slice("foo").unwrap().field("code").unwrap()
        ));
    }

    #[test]
    fn test_normalizer_receives_previous_values() {
        // Keep `max` no lower than `min`.
        let clamp = |value: Option<&Value>,
                     _previous: Option<&Value>,
                     all: &Value,
                     previous_all: &Value|
         -> Option<Value> {
            assert!(previous_all.is_object());
            let min = all["min"].as_i64()?;
            let max = value.and_then(Value::as_i64)?;
            Some(json!(max.max(min)))
        };
        let reducer = FormReducer.normalize(normalizers("range", "max", clamp));
        let state = reducer.reduce(
            &FormState::new(),
            &FormAction::initialize(json!({"min": 5, "max": 10}), None).for_form("range"),
        );
        let state = reducer.reduce(&state, &FormAction::change("max", json!(2)).for_form("range"));
        assert_eq!(
            state.slice("range").unwrap().values(),
            json!({"min": 5, "max": 5})
        );
    }
}

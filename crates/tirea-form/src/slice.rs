//! Form slices and the global form mapping.
//!
//! ```text
//! FormState  = { form name -> FormEntry }
//! FormEntry  = Single(FormSlice) | Keyed({ key -> FormSlice })
//! FormSlice  = { field path -> FieldRecord } + _active/_asyncValidating/_error/_submitting/_submitFailed
//! ```
//!
//! Every level is shared through `Arc`. Updating one field clones the map of
//! pointers above it and nothing else, so untouched records stay
//! pointer-identical across transitions.

use crate::field::{deserialize_present, FieldRecord};
use crate::values::get_values;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata key: path of the focused field.
pub const ACTIVE_KEY: &str = "_active";
/// Metadata key: async validation in flight.
pub const ASYNC_VALIDATING_KEY: &str = "_asyncValidating";
/// Metadata key: form-level error.
pub const ERROR_KEY: &str = "_error";
/// Metadata key: submission in flight.
pub const SUBMITTING_KEY: &str = "_submitting";
/// Metadata key: last submission failed.
pub const SUBMIT_FAILED_KEY: &str = "_submitFailed";

/// Field paths never begin with `_`; such keys belong to form metadata.
#[inline]
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with('_')
}

/// Live state of one form: field records plus the five metadata keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSlice {
    #[serde(rename = "_active", default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,

    #[serde(rename = "_asyncValidating", default)]
    pub async_validating: bool,

    #[serde(
        rename = "_error",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub error: Option<Value>,

    #[serde(rename = "_submitting", default)]
    pub submitting: bool,

    #[serde(rename = "_submitFailed", default)]
    pub submit_failed: bool,

    #[serde(flatten)]
    fields: BTreeMap<String, Arc<FieldRecord>>,
}

impl FormSlice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used to assemble fixtures and plugin output.
    pub fn with_field(mut self, path: impl Into<String>, record: FieldRecord) -> Self {
        self.fields.insert(path.into(), Arc::new(record));
        self
    }

    pub fn field(&self, path: &str) -> Option<&Arc<FieldRecord>> {
        self.fields.get(path)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Arc<FieldRecord>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Current plain value tree of this form.
    pub fn values(&self) -> Value {
        get_values(self)
    }

    /// True when every field's value equals its initial value.
    pub fn is_pristine(&self) -> bool {
        self.fields.values().all(|rec| rec.is_pristine())
    }

    pub fn is_dirty(&self) -> bool {
        !self.is_pristine()
    }

    /// Mutate one record in place, creating it when absent.
    ///
    /// Only the addressed record is copied; the rest keep their pointers.
    pub(crate) fn update_field(&mut self, path: &str, f: impl FnOnce(&mut FieldRecord)) {
        let rec = self.fields.entry(path.to_owned()).or_default();
        f(Arc::make_mut(rec));
    }

    /// Mutate every record for which `needs_update` holds.
    pub(crate) fn update_fields_where(
        &mut self,
        mut needs_update: impl FnMut(&str, &FieldRecord) -> bool,
        mut f: impl FnMut(&str, &mut FieldRecord),
    ) {
        for (path, rec) in self.fields.iter_mut() {
            if needs_update(path.as_str(), &**rec) {
                f(path.as_str(), Arc::make_mut(rec));
            }
        }
    }

    pub(crate) fn replace_fields(&mut self, fields: BTreeMap<String, Arc<FieldRecord>>) {
        self.fields = fields;
    }

    pub(crate) fn take_fields(&mut self) -> BTreeMap<String, Arc<FieldRecord>> {
        std::mem::take(&mut self.fields)
    }
}

/// One entry of the global mapping.
///
/// A form is either a single slice or, when its actions carry a `key`, a
/// container multiplexing several independent instances.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormEntry {
    Single(Arc<FormSlice>),
    Keyed(BTreeMap<String, Arc<FormSlice>>),
}

impl<'de> Deserialize<'de> for FormEntry {
    /// A map is a keyed container when it has no metadata keys of its own and
    /// every value is an object carrying metadata keys. The empty map is an
    /// empty container, as left behind by destroying its last instance.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let has_meta = |obj: &Map<String, Value>| obj.keys().any(|k| is_reserved_key(k));
        let keyed = !has_meta(&map)
            && map
                .values()
                .all(|v| v.as_object().is_some_and(|obj| has_meta(obj)));

        let value = Value::Object(map);
        let entry = if keyed {
            serde_json::from_value(value).map(FormEntry::Keyed)
        } else {
            serde_json::from_value(value).map(FormEntry::Single)
        };
        entry.map_err(D::Error::custom)
    }
}

/// Where an action's target slice lives.
#[derive(Debug)]
pub(crate) enum Target<'a> {
    Existing(&'a Arc<FormSlice>),
    Vacant,
    /// The entry's shape does not match the presence of `key`.
    Mismatch,
}

/// Global state: form name to form entry.
///
/// Cloning is a pointer copy. Use [`FormState::ptr_eq`] for cheap change
/// detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState {
    forms: Arc<BTreeMap<String, FormEntry>>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when both values share the same underlying mapping.
    #[inline]
    pub fn ptr_eq(a: &FormState, b: &FormState) -> bool {
        Arc::ptr_eq(&a.forms, &b.forms)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn contains(&self, form: &str) -> bool {
        self.forms.contains_key(form)
    }

    pub fn entry(&self, form: &str) -> Option<&FormEntry> {
        self.forms.get(form)
    }

    pub fn forms(&self) -> impl Iterator<Item = (&str, &FormEntry)> {
        self.forms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The slice of a single (non-keyed) form.
    pub fn slice(&self, form: &str) -> Option<&Arc<FormSlice>> {
        match self.forms.get(form)? {
            FormEntry::Single(slice) => Some(slice),
            FormEntry::Keyed(_) => None,
        }
    }

    /// The slice of one instance of a keyed form.
    pub fn keyed_slice(&self, form: &str, key: &str) -> Option<&Arc<FormSlice>> {
        match self.forms.get(form)? {
            FormEntry::Keyed(instances) => instances.get(key),
            FormEntry::Single(_) => None,
        }
    }

    /// Return a state with `form` set to a single slice.
    pub fn with_slice(&self, form: &str, slice: Arc<FormSlice>) -> FormState {
        if matches!(self.slice(form), Some(existing) if Arc::ptr_eq(existing, &slice)) {
            return self.clone();
        }
        self.with_entry(form, FormEntry::Single(slice))
    }

    /// Return a state with instance `key` of `form` set to `slice`.
    ///
    /// A single entry under the same name is replaced by a keyed container.
    pub fn with_keyed_slice(&self, form: &str, key: &str, slice: Arc<FormSlice>) -> FormState {
        let mut instances = match self.forms.get(form) {
            Some(FormEntry::Keyed(instances)) => {
                if matches!(instances.get(key), Some(existing) if Arc::ptr_eq(existing, &slice)) {
                    return self.clone();
                }
                instances.clone()
            }
            _ => BTreeMap::new(),
        };
        instances.insert(key.to_owned(), slice);
        self.with_entry(form, FormEntry::Keyed(instances))
    }

    pub fn with_entry(&self, form: &str, entry: FormEntry) -> FormState {
        let mut forms = Arc::clone(&self.forms);
        Arc::make_mut(&mut forms).insert(form.to_owned(), entry);
        FormState { forms }
    }

    /// Return a state without `form`. Unchanged (same pointer) if absent.
    pub fn without(&self, form: &str) -> FormState {
        if !self.forms.contains_key(form) {
            return self.clone();
        }
        let mut forms = Arc::clone(&self.forms);
        Arc::make_mut(&mut forms).remove(form);
        FormState { forms }
    }

    /// Return a state without instance `key` of `form`; the container stays.
    pub fn without_key(&self, form: &str, key: &str) -> FormState {
        match self.forms.get(form) {
            Some(FormEntry::Keyed(instances)) if instances.contains_key(key) => {
                let mut instances = instances.clone();
                instances.remove(key);
                self.with_entry(form, FormEntry::Keyed(instances))
            }
            _ => self.clone(),
        }
    }

    pub(crate) fn target(&self, form: &str, key: Option<&str>) -> Target<'_> {
        match (self.forms.get(form), key) {
            (None, _) => Target::Vacant,
            (Some(FormEntry::Single(slice)), None) => Target::Existing(slice),
            (Some(FormEntry::Keyed(instances)), Some(key)) => match instances.get(key) {
                Some(slice) => Target::Existing(slice),
                None => Target::Vacant,
            },
            (Some(_), _) => Target::Mismatch,
        }
    }

    pub(crate) fn install(&self, form: &str, key: Option<&str>, slice: Arc<FormSlice>) -> FormState {
        match key {
            Some(key) => self.with_keyed_slice(form, key, slice),
            None => self.with_slice(form, slice),
        }
    }
}

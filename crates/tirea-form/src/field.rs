//! Per-field state records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// State for one addressable field.
///
/// Every attribute is optional and presence-significant: `None` means the key
/// is absent, while `Some(Value::Null)` is an explicit `null`. Consumers decide
/// whether to render an error indicator from presence alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldRecord {
    /// Current value.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub value: Option<Value>,

    /// Value set by the last initialize/reset.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub initial: Option<Value>,

    /// Blurred at least once with touch requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched: Option<bool>,

    /// Received focus at least once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited: Option<bool>,

    /// Error from the latest async validation pass.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub async_error: Option<Value>,

    /// Error from the latest submit attempt.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub submit_error: Option<Value>,
}

impl FieldRecord {
    /// A record holding only a value.
    pub fn with_value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// A freshly initialized record: `{initial: v, value: v}`.
    pub fn initialized(initial: Option<Value>) -> Self {
        Self {
            value: initial.clone(),
            initial,
            ..Self::default()
        }
    }

    /// True when the record is exactly `{initial, value: initial}`.
    pub fn is_reset(&self) -> bool {
        self.initial.is_some()
            && self.value == self.initial
            && self.touched.is_none()
            && self.visited.is_none()
            && self.async_error.is_none()
            && self.submit_error.is_none()
    }

    /// True when `value` equals `initial` (both absent counts as equal).
    pub fn is_pristine(&self) -> bool {
        self.value == self.initial
    }

    pub fn is_touched(&self) -> bool {
        self.touched.unwrap_or(false)
    }
}

/// Deserialize an attribute that is present in the input, keeping an explicit
/// `null` as `Some(Value::Null)`. Combined with `#[serde(default)]`, absence
/// becomes `None`.
pub(crate) fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

//! Action records consumed by the reducer.
//!
//! The serialized shape follows the conventional record
//! `{type, form, key?, field?, fields?, value?, touch?, values?, errors?, ...}`
//! with the `type` tag in SCREAMING_SNAKE_CASE. Any unrecognised `type`
//! decodes to [`ActionKind::Other`], which every transition treats as a no-op.

use crate::field::deserialize_present;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error payload of STOP_ASYNC_VALIDATION / STOP_SUBMIT: field path to error,
/// plus an optional reserved `_error` entry for the form-level error.
pub type ErrorMap = Map<String, Value>;

/// One user or system event addressed to a form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormAction {
    /// Target form. Actions without a form leave the state untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,

    /// Instance key for forms that multiplex several instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(flatten)]
    pub kind: ActionKind,
}

/// The event carried by an action, with its payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    #[serde(rename_all = "camelCase")]
    Blur {
        field: String,
        /// `None` when the platform could not supply a value; distinct from
        /// an explicit `null`.
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "deserialize_present"
        )]
        value: Option<Value>,
        #[serde(default)]
        touch: bool,
    },

    #[serde(rename_all = "camelCase")]
    Change {
        field: String,
        value: Value,
        #[serde(default)]
        touch: bool,
    },

    Focus {
        field: String,
    },

    #[serde(rename_all = "camelCase")]
    Initialize {
        #[serde(default)]
        values: Value,
        /// Explicit field list; when absent the value tree is flattened.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
        /// Accepted but deliberately not applied to field records.
        #[serde(default)]
        touch: bool,
    },

    Reset,

    StartAsyncValidation,

    StopAsyncValidation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        errors: Option<ErrorMap>,
    },

    StartSubmit,

    StopSubmit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        errors: Option<ErrorMap>,
    },

    Touch {
        fields: Vec<String>,
    },

    Untouch {
        fields: Vec<String>,
    },

    Destroy,

    /// Unrecognised action type.
    #[serde(other)]
    Other,
}

impl ActionKind {
    /// The wire name of this action type.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Blur { .. } => "BLUR",
            ActionKind::Change { .. } => "CHANGE",
            ActionKind::Focus { .. } => "FOCUS",
            ActionKind::Initialize { .. } => "INITIALIZE",
            ActionKind::Reset => "RESET",
            ActionKind::StartAsyncValidation => "START_ASYNC_VALIDATION",
            ActionKind::StopAsyncValidation { .. } => "STOP_ASYNC_VALIDATION",
            ActionKind::StartSubmit => "START_SUBMIT",
            ActionKind::StopSubmit { .. } => "STOP_SUBMIT",
            ActionKind::Touch { .. } => "TOUCH",
            ActionKind::Untouch { .. } => "UNTOUCH",
            ActionKind::Destroy => "DESTROY",
            ActionKind::Other => "OTHER",
        }
    }
}

impl FormAction {
    /// An action not yet addressed to any form.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            form: None,
            key: None,
            kind,
        }
    }

    /// The action dispatched to compute a reducer's initial state.
    pub fn init() -> Self {
        Self::new(ActionKind::Other)
    }

    /// True when this action removes the whole of `form`.
    pub fn destroys(&self, form: &str) -> bool {
        matches!(self.kind, ActionKind::Destroy)
            && self.key.is_none()
            && self.form.as_deref() == Some(form)
    }

    /// Address this action to `form`.
    pub fn for_form(mut self, form: impl Into<String>) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Address this action to instance `key` of its form.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Request touch on BLUR/CHANGE/INITIALIZE. Ignored by other kinds.
    pub fn touching(mut self) -> Self {
        match &mut self.kind {
            ActionKind::Blur { touch, .. }
            | ActionKind::Change { touch, .. }
            | ActionKind::Initialize { touch, .. } => *touch = true,
            _ => {}
        }
        self
    }

    pub fn blur(field: impl Into<String>, value: Option<Value>) -> Self {
        Self::new(ActionKind::Blur {
            field: field.into(),
            value,
            touch: false,
        })
    }

    pub fn change(field: impl Into<String>, value: Value) -> Self {
        Self::new(ActionKind::Change {
            field: field.into(),
            value,
            touch: false,
        })
    }

    pub fn focus(field: impl Into<String>) -> Self {
        Self::new(ActionKind::Focus {
            field: field.into(),
        })
    }

    pub fn initialize(values: Value, fields: Option<Vec<String>>) -> Self {
        Self::new(ActionKind::Initialize {
            values,
            fields,
            timestamp: None,
            touch: false,
        })
    }

    pub fn reset() -> Self {
        Self::new(ActionKind::Reset)
    }

    pub fn start_async_validation() -> Self {
        Self::new(ActionKind::StartAsyncValidation)
    }

    pub fn stop_async_validation(errors: Option<ErrorMap>) -> Self {
        Self::new(ActionKind::StopAsyncValidation { errors })
    }

    pub fn start_submit() -> Self {
        Self::new(ActionKind::StartSubmit)
    }

    pub fn stop_submit(errors: Option<ErrorMap>) -> Self {
        Self::new(ActionKind::StopSubmit { errors })
    }

    pub fn touch<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ActionKind::Touch {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    pub fn untouch<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ActionKind::Untouch {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }

    pub fn destroy() -> Self {
        Self::new(ActionKind::Destroy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_blur_distinguishes_null_from_absent() {
        let absent: FormAction =
            serde_json::from_value(json!({"type": "BLUR", "form": "foo", "field": "a"})).unwrap();
        let null: FormAction = serde_json::from_value(
            json!({"type": "BLUR", "form": "foo", "field": "a", "value": null, "touch": true}),
        )
        .unwrap();

        assert_eq!(
            absent.kind,
            ActionKind::Blur {
                field: "a".into(),
                value: None,
                touch: false
            }
        );
        assert_eq!(
            null.kind,
            ActionKind::Blur {
                field: "a".into(),
                value: Some(Value::Null),
                touch: true
            }
        );
    }

    #[test]
    fn test_decode_unknown_type_is_other() {
        let action: FormAction =
            serde_json::from_value(json!({"type": "SOMETHING_ELSE", "form": "foo"})).unwrap();
        assert_eq!(action.kind, ActionKind::Other);
        assert_eq!(action.form.as_deref(), Some("foo"));
    }

    #[test]
    fn test_decode_stop_submit_with_errors() {
        let action: FormAction = serde_json::from_value(json!({
            "type": "STOP_SUBMIT",
            "form": "foo",
            "key": "k1",
            "errors": {"name": "Required", "_error": "Nope"}
        }))
        .unwrap();
        assert_eq!(action.key.as_deref(), Some("k1"));
        let ActionKind::StopSubmit { errors: Some(errors) } = action.kind else {
            panic!("expected STOP_SUBMIT with errors");
        };
        assert_eq!(errors["name"], "Required");
        assert_eq!(errors["_error"], "Nope");
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let action = FormAction::change("name", json!("Ava"))
            .for_form("foo")
            .touching();
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"type": "CHANGE", "form": "foo", "field": "name", "value": "Ava", "touch": true})
        );
    }

    #[test]
    fn test_touching_ignored_for_focus() {
        let action = FormAction::focus("a").touching();
        assert_eq!(action.kind, ActionKind::Focus { field: "a".into() });
    }
}

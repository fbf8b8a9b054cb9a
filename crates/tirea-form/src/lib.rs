//! Pure reducer for path-addressed form state.
//!
//! `tirea-form` keeps the live state of many named forms in one immutable
//! mapping. Each form tracks, per field path, the current value, the initial
//! value and interaction flags, plus a handful of form-level metadata keys.
//! All changes go through a reducer, so state transitions are deterministic
//! and replayable.
//!
//! # Core Concepts
//!
//! - **Path**: Dotted/bracketed field address such as `items[0].name`
//! - **FieldRecord**: Value, initial value, touched/visited flags and errors of one field
//! - **FormSlice**: All field records of a form plus `_active`, `_error` and friends
//! - **FormState**: Form name to slice (or to keyed instances of a slice)
//! - **FormAction**: One event addressed to a form, decoded from `{type, form, ...}`
//! - **Reducer**: `(FormState, FormAction) -> FormState`, decorated with plugins and normalizers
//! - **FormStore**: Current state plus action history with replay
//!
//! # Deterministic Transitions
//!
//! ```text
//! State' = reduce(State, Action)
//! ```
//!
//! - Same `(State, Action)` always produces the same `State'`
//! - The input is never mutated; unchanged subtrees keep their `Arc` pointers
//! - Actions the reducer does not understand return the input as is
//!
//! # Quick Start
//!
//! ```
//! use tirea_form::{reduce, FormAction, FormState};
//! use serde_json::json;
//!
//! let state = FormState::new();
//! let state = reduce(
//!     &state,
//!     &FormAction::initialize(json!({"name": "Meck", "items": [{"amount": 10}]}), None)
//!         .for_form("order"),
//! );
//! let state = reduce(&state, &FormAction::change("items[0].amount", json!(12)).for_form("order"));
//!
//! let order = state.slice("order").unwrap();
//! assert_eq!(order.values(), json!({"name": "Meck", "items": [{"amount": 12}]}));
//! assert!(order.is_dirty());
//! ```
//!
//! # Decorating the Reducer
//!
//! ```
//! use std::sync::Arc;
//! use tirea_form::{FieldNormalizers, FormAction, FormReducer, NormalizerMap, Reducer, ReducerExt};
//! use serde_json::{json, Value};
//!
//! let mut fields = FieldNormalizers::new();
//! fields.insert(
//!     "code".into(),
//!     Arc::new(|value: Option<&Value>, _: Option<&Value>, _: &Value, _: &Value| {
//!         value.and_then(Value::as_str).map(|s| json!(s.trim()))
//!     }),
//! );
//! let mut normalizers = NormalizerMap::new();
//! normalizers.insert("coupon".into(), fields);
//!
//! let reducer = FormReducer.normalize(normalizers);
//! let state = reducer.reduce(
//!     &reducer.initial_state(),
//!     &FormAction::change("code", json!("  SAVE10 ")).for_form("coupon"),
//! );
//! assert_eq!(state.slice("coupon").unwrap().values(), json!({"code": "SAVE10"}));
//! ```

pub mod access;
mod action;
mod error;
mod field;
mod normalize;
mod path;
mod plugin;
mod reducer;
mod slice;
mod store;
mod transition;
mod values;

pub use access::{delete_at_path, get_at_path, read, set_at_path, write};
pub use action::{ActionKind, ErrorMap, FormAction};
pub use error::{FormError, FormResult, PathError};
pub use field::FieldRecord;
pub use normalize::{FieldNormalizer, FieldNormalizers, NormalizerMap, Normalized};
pub use path::{parse_path, Path, Seg, MAX_INDEX};
pub use plugin::{FormPlugin, Plugged, PluginMap};
pub use reducer::{reduce, FormReducer, Reducer, ReducerExt};
pub use slice::{
    is_reserved_key, FormEntry, FormSlice, FormState, ACTIVE_KEY, ASYNC_VALIDATING_KEY, ERROR_KEY,
    SUBMITTING_KEY, SUBMIT_FAILED_KEY,
};
pub use store::{DispatchResult, FormStore, StoreConfig};
pub use transition::{flatten_values, nest_errors, transition};
pub use values::get_values;

// Re-export serde_json::Value for convenience
pub use serde_json::Value;

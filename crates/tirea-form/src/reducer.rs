//! The dispatch root and the reducer seam.

use crate::action::{ActionKind, FormAction};
use crate::normalize::{Normalized, NormalizerMap};
use crate::plugin::{PluginMap, Plugged};
use crate::slice::{FormSlice, FormState, Target};
use crate::transition::transition;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A pure state transition over the global form mapping.
///
/// Implementations are total: every `(state, action)` pair yields a state and
/// anything not understood leaves the input unchanged.
pub trait Reducer: Send + Sync {
    /// Compute the next state.
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState;

    /// The state produced by dispatching the init action against nothing.
    fn initial_state(&self) -> FormState {
        self.reduce(&FormState::default(), &FormAction::init())
    }
}

impl<R: Reducer + ?Sized> Reducer for Box<R> {
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState {
        (**self).reduce(state, action)
    }
}

impl<R: Reducer + ?Sized> Reducer for Arc<R> {
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState {
        (**self).reduce(state, action)
    }
}

/// Decorators available on every reducer.
pub trait ReducerExt: Reducer + Sized {
    /// Run per-form plugins after each dispatch.
    fn plugin(self, plugins: PluginMap) -> Plugged<Self> {
        Plugged::new(self, plugins)
    }

    /// Run per-field normalizers after each dispatch.
    fn normalize(self, normalizers: NormalizerMap) -> Normalized<Self> {
        Normalized::new(self, normalizers)
    }
}

impl<R: Reducer + Sized> ReducerExt for R {}

/// The dispatch root: routes an action to its form and transition.
///
/// - No `form`: the state is returned as is (same pointer).
/// - The target slice is created with default metadata on first use.
/// - DESTROY removes the form, or only the keyed instance when `key` is set.
#[derive(Clone, Copy, Debug, Default)]
pub struct FormReducer;

impl FormReducer {
    pub fn new() -> Self {
        Self
    }
}

impl Reducer for FormReducer {
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState {
        let Some(form) = action.form.as_deref() else {
            return state.clone();
        };
        let key = action.key.as_deref();
        trace!(form, key, action = action.kind.name(), "dispatch");

        if matches!(action.kind, ActionKind::Destroy) {
            return destroy(state, form, key);
        }

        let current = match state.target(form, key) {
            Target::Existing(slice) => Arc::clone(slice),
            Target::Vacant => Arc::new(FormSlice::default()),
            Target::Mismatch => {
                warn!(form, key, action = action.kind.name(), "action key does not match form shape");
                return state.clone();
            }
        };

        let next = transition(&current, &action.kind);
        state.install(form, key, next)
    }
}

fn destroy(state: &FormState, form: &str, key: Option<&str>) -> FormState {
    match key {
        Some(key) => {
            debug!(form, key, "destroying form instance");
            state.without_key(form, key)
        }
        None => {
            debug!(form, "destroying form");
            state.without(form)
        }
    }
}

/// Reduce with the plain dispatch root.
pub fn reduce(state: &FormState, action: &FormAction) -> FormState {
    FormReducer.reduce(state, action)
}

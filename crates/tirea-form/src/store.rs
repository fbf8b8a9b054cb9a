//! FormStore holds the current form state together with its action history.
//!
//! Every change goes through a dispatched action, which enables:
//! - Replay of the state at any point in the history
//! - Bounded history with older actions folded into the base state
//! - Reference-equality change detection between dispatches

use crate::action::FormAction;
use crate::error::{FormError, FormResult};
use crate::reducer::Reducer;
use crate::slice::FormState;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of actions kept for replay. `None` keeps everything.
    pub max_history: Option<usize>,
}

impl StoreConfig {
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = Some(max_history);
        self
    }
}

/// Outcome of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchResult {
    /// Number of actions applied.
    pub actions_applied: usize,
    /// Whether the resulting state differs (by pointer) from the previous one.
    pub changed: bool,
}

/// Serializes actions through a reducer and records them.
///
/// # Example
///
/// ```
/// use tirea_form::{FormAction, FormReducer, FormStore};
/// use serde_json::json;
///
/// let mut store = FormStore::new(FormReducer);
/// store.dispatch(FormAction::change("name", json!("Ava")).for_form("profile"));
/// store.dispatch(FormAction::change("name", json!("Meck")).for_form("profile"));
///
/// let before = store.replay_to(0).unwrap();
/// assert_eq!(before.slice("profile").unwrap().values(), json!({"name": "Ava"}));
/// ```
pub struct FormStore<R> {
    reducer: R,
    config: StoreConfig,
    base: FormState,
    state: FormState,
    history: Vec<FormAction>,
}

impl<R: Reducer> FormStore<R> {
    /// Create a store starting from the reducer's initial state.
    pub fn new(reducer: R) -> Self {
        Self::with_config(reducer, StoreConfig::default())
    }

    pub fn with_config(reducer: R, config: StoreConfig) -> Self {
        let initial = reducer.initial_state();
        Self::from_state(reducer, config, initial)
    }

    /// Create a store starting from an existing state.
    pub fn from_state(reducer: R, config: StoreConfig, state: FormState) -> Self {
        Self {
            reducer,
            config,
            base: state.clone(),
            state,
            history: Vec::new(),
        }
    }

    /// The current state.
    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Apply one action.
    pub fn dispatch(&mut self, action: FormAction) -> DispatchResult {
        let next = self.reducer.reduce(&self.state, &action);
        let changed = !FormState::ptr_eq(&self.state, &next);
        trace!(action = action.kind.name(), form = action.form.as_deref(), changed, "store dispatch");
        self.state = next;
        self.history.push(action);
        self.enforce_history_limit();
        DispatchResult {
            actions_applied: 1,
            changed,
        }
    }

    /// Decode a wire action record and apply it.
    ///
    /// A record that does not decode is not recorded and leaves the state
    /// untouched.
    pub fn dispatch_json(&mut self, raw: &str) -> FormResult<DispatchResult> {
        let action: FormAction = serde_json::from_str(raw)?;
        Ok(self.dispatch(action))
    }

    /// Apply actions in order.
    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = FormAction>) -> DispatchResult {
        let before = self.state.clone();
        let mut applied = 0;
        for action in actions {
            self.state = self.reducer.reduce(&self.state, &action);
            self.history.push(action);
            applied += 1;
        }
        self.enforce_history_limit();
        DispatchResult {
            actions_applied: applied,
            changed: !FormState::ptr_eq(&before, &self.state),
        }
    }

    /// Rebuild the state after applying history entries `[0..=index]`.
    pub fn replay_to(&self, index: usize) -> FormResult<FormState> {
        if index >= self.history.len() {
            return Err(FormError::InvalidReplayIndex {
                index,
                len: self.history.len(),
            });
        }
        Ok(self.history[..=index]
            .iter()
            .fold(self.base.clone(), |state, action| self.reducer.reduce(&state, action)))
    }

    /// The recorded actions, oldest first.
    pub fn history(&self) -> &[FormAction] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Drop all recorded actions; the current state becomes the replay base.
    pub fn clear_history(&mut self) {
        self.base = self.state.clone();
        self.history.clear();
    }

    /// Keep only the last `keep_last` actions, folding older ones into the
    /// replay base. Returns the number of actions removed.
    pub fn prune_history(&mut self, keep_last: usize) -> usize {
        let len = self.history.len();
        if len <= keep_last {
            return 0;
        }
        let to_remove = len - keep_last;
        let base = self
            .history
            .drain(..to_remove)
            .fold(self.base.clone(), |state, action| self.reducer.reduce(&state, &action));
        self.base = base;
        debug!(removed = to_remove, kept = keep_last, "pruned form history");
        to_remove
    }

    fn enforce_history_limit(&mut self) {
        if let Some(max) = self.config.max_history {
            self.prune_history(max);
        }
    }
}

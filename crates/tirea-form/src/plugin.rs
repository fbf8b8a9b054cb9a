//! Per-form plugins that post-process a reducer's output.
//!
//! A plugin receives the slice the inner reducer produced for its form,
//! together with the dispatched action and the full next state, and returns
//! the slice to install. Returning the input pointer leaves the state as is.
//!
//! Plugins run after every dispatch, including the init action, so a plugin
//! for a form that does not exist yet runs against a freshly created default
//! slice. The one exception is the dispatch that destroys the form itself.

use crate::action::FormAction;
use crate::reducer::Reducer;
use crate::slice::{FormEntry, FormSlice, FormState};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A sub-reducer for one form.
pub trait FormPlugin: Send + Sync {
    fn apply(&self, slice: &Arc<FormSlice>, action: &FormAction, state: &FormState) -> Arc<FormSlice>;
}

impl<F> FormPlugin for F
where
    F: Fn(&Arc<FormSlice>, &FormAction, &FormState) -> Arc<FormSlice> + Send + Sync,
{
    fn apply(&self, slice: &Arc<FormSlice>, action: &FormAction, state: &FormState) -> Arc<FormSlice> {
        self(slice, action, state)
    }
}

/// Form name to plugin.
pub type PluginMap = BTreeMap<String, Arc<dyn FormPlugin>>;

/// A reducer wrapped with per-form plugins. Built by [`crate::ReducerExt::plugin`].
pub struct Plugged<R> {
    inner: R,
    plugins: PluginMap,
}

impl<R> Plugged<R> {
    pub fn new(inner: R, plugins: PluginMap) -> Self {
        Self { inner, plugins }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Reducer> Reducer for Plugged<R> {
    fn reduce(&self, state: &FormState, action: &FormAction) -> FormState {
        let result = self.inner.reduce(state, action);
        self.plugins
            .iter()
            .filter(|(form, _)| !action.destroys(form))
            .fold(result, |acc, (form, plugin)| apply_plugin(acc, form, plugin.as_ref(), action))
    }
}

fn apply_plugin(state: FormState, form: &str, plugin: &dyn FormPlugin, action: &FormAction) -> FormState {
    match state.entry(form) {
        Some(FormEntry::Single(slice)) => {
            let next = plugin.apply(slice, action, &state);
            state.with_slice(form, next)
        }
        Some(FormEntry::Keyed(instances)) => {
            let instances = instances.clone();
            instances.iter().fold(state, |acc, (key, slice)| {
                let next = plugin.apply(slice, action, &acc);
                acc.with_keyed_slice(form, key, next)
            })
        }
        None => {
            let slice = Arc::new(FormSlice::default());
            let next = plugin.apply(&slice, action, &state);
            state.with_slice(form, next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{FormReducer, ReducerExt};

    fn plugins(form: &str, plugin: impl FormPlugin + 'static) -> PluginMap {
        let mut map = PluginMap::new();
        map.insert(form.to_owned(), Arc::new(plugin));
        map
    }

    #[test]
    fn test_identity_plugin_creates_default_slice() {
        let reducer = FormReducer.plugin(plugins(
            "foo",
            |slice: &Arc<FormSlice>, _: &FormAction, _: &FormState| Arc::clone(slice),
        ));
        let state = reducer.initial_state();
        assert_eq!(state.len(), 1);
        assert_eq!(**state.slice("foo").unwrap(), FormSlice::default());
    }

    #[test]
    fn test_plugin_sees_inner_result() {
        let reducer = FormReducer.plugin(plugins(
            "foo",
            |slice: &Arc<FormSlice>, action: &FormAction, _: &FormState| {
                if action.kind.name() != "START_SUBMIT" {
                    return Arc::clone(slice);
                }
                let mut next = (**slice).clone();
                next.error = None;
                next.submit_failed = false;
                Arc::new(next)
            },
        ));
        let state = reducer.reduce(
            &FormState::new(),
            &FormAction::stop_submit(Some(Default::default())).for_form("foo"),
        );
        assert!(state.slice("foo").unwrap().submit_failed);

        let state = reducer.reduce(&state, &FormAction::start_submit().for_form("foo"));
        let slice = state.slice("foo").unwrap();
        assert!(slice.submitting);
        assert!(!slice.submit_failed);
    }

    #[test]
    fn test_plugin_for_keyed_form_runs_per_instance() {
        let reducer = FormReducer.plugin(plugins(
            "multi",
            |slice: &Arc<FormSlice>, _: &FormAction, _: &FormState| {
                let mut next = (**slice).clone();
                next.async_validating = true;
                Arc::new(next)
            },
        ));
        let state = reducer.reduce(
            &FormState::new(),
            &FormAction::focus("a").for_form("multi").with_key("one"),
        );
        let state = reducer.reduce(&state, &FormAction::focus("a").for_form("multi").with_key("two"));
        assert!(state.keyed_slice("multi", "one").unwrap().async_validating);
        assert!(state.keyed_slice("multi", "two").unwrap().async_validating);
    }
}

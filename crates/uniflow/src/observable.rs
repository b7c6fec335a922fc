//! Observable interop surface.
//!
//! A minimal push-based contract over the store's state for integration with
//! reactive consumers: subscribing emits the current state immediately and
//! again after every dispatch. Reachable through [`Store::observable`], the
//! documented reserved entry point alongside the four store operations.

use crate::reducer::StateSlot;
use crate::store::{Store, Subscription};
use std::sync::Arc;

/// Observer record accepted by [`StateObservable::subscribe`]. Wraps the
/// `next` callback invoked with each state emission.
pub struct Observer {
    next: Option<Arc<dyn Fn(StateSlot) + Send + Sync>>,
}

impl Observer {
    /// Observer with a `next` callback.
    pub fn new<F>(next: F) -> Self
    where
        F: Fn(StateSlot) + Send + Sync + 'static,
    {
        Self {
            next: Some(Arc::new(next)),
        }
    }

    /// Observer without callbacks; emissions are accepted and ignored.
    pub fn empty() -> Self {
        Self { next: None }
    }
}

/// Observable over a store's state.
pub struct StateObservable {
    store: Store,
}

impl StateObservable {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Subscribe an observer. Its `next` callback receives the current state
    /// immediately, then the new state after every subsequent dispatch, until
    /// the returned handle is unsubscribed.
    pub fn subscribe(&self, observer: Observer) -> ObservableSubscription {
        let Some(next) = observer.next else {
            return ObservableSubscription { inner: None };
        };

        next(self.store.state());

        // The store retains this listener; hold it weakly so the interop
        // surface cannot keep the store alive through its own registry.
        let store = self.store.downgrade();
        let inner = self.store.subscribe(move || {
            let next = Arc::clone(&next);
            let state = store.upgrade().and_then(|store| store.state());
            async move {
                next(state);
            }
        });
        ObservableSubscription { inner: Some(inner) }
    }
}

/// Handle returned by [`StateObservable::subscribe`].
pub struct ObservableSubscription {
    inner: Option<Subscription>,
}

impl ObservableSubscription {
    /// Stop receiving emissions. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(inner) = &self.inner {
            inner.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::combine::combine_reducers;
    use crate::reducer::{from_fn, slot, Reducer, StateSlot};
    use crate::store::create_store;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn flag(kind: &'static str, when_set: i64) -> Reducer {
        from_fn(move |state: StateSlot, action: &Action| {
            if action.kind() == kind {
                Ok(slot(when_set))
            } else {
                Ok(state.or_else(|| slot(0)))
            }
        })
    }

    fn foo_bar() -> Reducer {
        combine_reducers(vec![("foo", Some(flag("foo", 1))), ("bar", Some(flag("bar", 2)))])
    }

    fn recording_observer(results: &Arc<Mutex<Vec<Value>>>) -> Observer {
        let results = Arc::clone(results);
        Observer::new(move |state: StateSlot| {
            if let Some(state) = state.as_deref() {
                results.lock().unwrap().push(state.clone());
            }
        })
    }

    #[tokio::test]
    async fn test_emits_the_current_state_on_subscribe_and_after_each_dispatch() {
        let store = create_store(foo_bar(), None, None).await.unwrap();
        let results = Arc::new(Mutex::new(Vec::new()));

        store.observable().subscribe(recording_observer(&results));

        store.dispatch(Action::new("foo")).await.unwrap();
        store.dispatch(Action::new("bar")).await.unwrap();

        assert_eq!(
            results.lock().unwrap().clone(),
            vec![
                json!({ "foo": 0, "bar": 0 }),
                json!({ "foo": 1, "bar": 0 }),
                json!({ "foo": 1, "bar": 2 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_unsubscribing_stops_emissions() {
        let store = create_store(foo_bar(), None, None).await.unwrap();
        let results = Arc::new(Mutex::new(Vec::new()));

        let subscription = store.observable().subscribe(recording_observer(&results));

        store.dispatch(Action::new("foo")).await.unwrap();
        subscription.unsubscribe();
        subscription.unsubscribe();
        store.dispatch(Action::new("bar")).await.unwrap();

        assert_eq!(
            results.lock().unwrap().clone(),
            vec![json!({ "foo": 0, "bar": 0 }), json!({ "foo": 1, "bar": 0 })]
        );
    }

    #[tokio::test]
    async fn test_an_empty_observer_is_accepted() {
        let store = create_store(foo_bar(), None, None).await.unwrap();
        let subscription = store.observable().subscribe(Observer::empty());
        store.dispatch(Action::new("foo")).await.unwrap();
        subscription.unsubscribe();
    }
}

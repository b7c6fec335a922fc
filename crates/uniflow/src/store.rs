//! Store - holds application state and runs the dispatch loop.
//!
//! The store follows the unidirectional pattern:
//! - Centralized state, replaced wholesale on each action, never mutated
//! - Actions are dispatched to compute state transitions
//! - Pure reducers produce the next state
//! - Listeners observe committed transitions
//!
//! Exactly one dispatch is in flight at a time. The flag guarding this is
//! owned by the store instance, so independent stores enforce the rule
//! independently.

use crate::action::{self, Action};
use crate::error::StoreError;
use crate::observable::StateObservable;
use crate::reducer::{BoxFuture, Reducer, StateSlot};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

/// Listener callback registered with [`Store::subscribe`]. Zero arguments;
/// reads the state it needs back off the store.
pub type Listener = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// The dispatch function. Middleware wraps values of this type; the innermost
/// one applies the reducer and notifies listeners.
pub type Dispatch =
    Arc<dyn Fn(Action) -> BoxFuture<'static, Result<Action, StoreError>> + Send + Sync>;

/// Boxed store-creation function. Enhancers receive and return one of these.
pub type StoreCreator =
    Box<dyn FnOnce(Reducer, StateSlot) -> BoxFuture<'static, Result<Store, StoreError>> + Send>;

/// Store enhancer: wraps store creation itself. Middleware installs through
/// one (see [`crate::apply_middleware`]).
pub type Enhancer = Box<dyn FnOnce(StoreCreator) -> StoreCreator + Send>;

/// Create a store driven by `reducer`.
///
/// Construction performs exactly one internal dispatch with a reserved action
/// type, seeding state from the reducer's defaults on top of
/// `preloaded_state`. A preloaded state whose shape the reducer does not
/// recognize produces a non-fatal diagnostic; construction still succeeds.
///
/// When `enhancer` is given it wraps the store-creation function itself and
/// its result is returned instead.
pub async fn create_store(
    reducer: Reducer,
    preloaded_state: StateSlot,
    enhancer: Option<Enhancer>,
) -> Result<Store, StoreError> {
    match enhancer {
        Some(enhance) => {
            let creator: StoreCreator = Box::new(
                |reducer: Reducer, preloaded: StateSlot| -> BoxFuture<'static, Result<Store, StoreError>> {
                    Box::pin(Store::base(reducer, preloaded))
                },
            );
            enhance(creator)(reducer, preloaded_state).await
        }
        None => Store::base(reducer, preloaded_state).await,
    }
}

pub(crate) struct StoreInner {
    state: RwLock<StateSlot>,
    reducer: RwLock<Reducer>,
    // Registry mutated by subscribe/unsubscribe. Dispatch notifies a snapshot
    // taken when notification begins, so mutations during a pass only take
    // effect on the next dispatch.
    next_listeners: Mutex<Vec<(u64, Listener)>>,
    listener_seq: AtomicU64,
    dispatching: AtomicBool,
    dispatch_fn: RwLock<Dispatch>,
}

impl StoreInner {
    async fn base_dispatch(&self, action: Action) -> Result<Action, StoreError> {
        if self.dispatching.swap(true, Ordering::SeqCst) {
            return Err(StoreError::DispatchInProgress);
        }

        let reducer = self.reducer.read().unwrap().clone();
        let previous = self.state.read().unwrap().clone();
        let next = match reducer(previous, action.clone()).await {
            Ok(next) => next,
            Err(err) => {
                self.dispatching.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };

        // Whole-state replacement is atomic: readers see either the previous
        // or the next state, never a partial transition.
        *self.state.write().unwrap() = next;
        self.dispatching.store(false, Ordering::SeqCst);

        let snapshot: Vec<Listener> = self
            .next_listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener().await;
        }

        Ok(action)
    }
}

fn base_dispatch_fn(inner: Weak<StoreInner>) -> Dispatch {
    Arc::new(
        move |action: Action| -> BoxFuture<'static, Result<Action, StoreError>> {
            let inner = inner.clone();
            Box::pin(async move {
                let inner = inner.upgrade().ok_or(StoreError::StoreGone)?;
                inner.base_dispatch(action).await
            })
        },
    )
}

/// Store handle. Cloning yields another handle to the same store; the store
/// lives as long as any handle does.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    async fn base(reducer: Reducer, preloaded_state: StateSlot) -> Result<Store, StoreError> {
        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner>| StoreInner {
            state: RwLock::new(preloaded_state),
            reducer: RwLock::new(reducer),
            next_listeners: Mutex::new(Vec::new()),
            listener_seq: AtomicU64::new(0),
            dispatching: AtomicBool::new(false),
            dispatch_fn: RwLock::new(base_dispatch_fn(weak.clone())),
        });
        inner.base_dispatch(action::init()).await?;
        Ok(Store { inner })
    }

    /// Current state. Never observes a partially applied transition.
    pub fn state(&self) -> StateSlot {
        self.inner.state.read().unwrap().clone()
    }

    /// Dispatch an action through the store's current dispatch function (the
    /// middleware chain when one is installed) and return it.
    ///
    /// Fails fast with [`StoreError::DispatchInProgress`] when a reducer is
    /// already executing; errors raised by the reducer propagate unmodified
    /// and leave the state at its last committed value.
    pub async fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        let dispatch = self.inner.dispatch_fn.read().unwrap().clone();
        dispatch(action).await
    }

    /// Register a listener, invoked after every committed dispatch.
    ///
    /// A listener registered during a notification pass is first invoked on
    /// the next dispatch. The returned handle removes the listener; calling
    /// it more than once is a no-op.
    pub fn subscribe<F, Fut>(&self, listener: F) -> Subscription
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener: Listener = Arc::new(move || Box::pin(listener()) as BoxFuture<'static, ()>);
        let id = self.inner.listener_seq.fetch_add(1, Ordering::Relaxed);
        self.inner
            .next_listeners
            .lock()
            .unwrap()
            .push((id, listener));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Swap the active reducer, then run the internal replacement action so
    /// every slice the new reducer introduces can seed its key. Existing
    /// state and listeners are preserved.
    pub async fn replace_reducer(&self, next: Reducer) -> Result<(), StoreError> {
        *self.inner.reducer.write().unwrap() = next;
        self.inner.base_dispatch(action::replace()).await?;
        Ok(())
    }

    /// Minimal observable interop surface over the store's state. This is the
    /// reserved interop entry point, separate from the four store operations.
    pub fn observable(&self) -> StateObservable {
        StateObservable::new(self.clone())
    }

    pub(crate) fn set_dispatch(&self, dispatch: Dispatch) {
        *self.inner.dispatch_fn.write().unwrap() = dispatch;
    }

    pub(crate) fn current_dispatch(&self) -> Dispatch {
        self.inner.dispatch_fn.read().unwrap().clone()
    }

    pub(crate) fn base_dispatch_fn(&self) -> Dispatch {
        base_dispatch_fn(Arc::downgrade(&self.inner))
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

// Non-owning store handle for callbacks the store itself retains (middleware
// stages, interop listeners). A strong handle there would keep the store
// alive through its own registries.
pub(crate) struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

/// Handle returned by [`Store::subscribe`].
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove the listener from all future notification passes. The pass in
    /// progress, if any, still delivers to its snapshot. Idempotent.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .next_listeners
                .lock()
                .unwrap()
                .retain(|(id, _)| *id != self.id);
        }
    }
}

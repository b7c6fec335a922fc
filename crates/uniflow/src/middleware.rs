//! Middleware system.
//!
//! Middleware sits between action dispatch and reducer execution, allowing
//! side effects, async orchestration, logging, and other cross-cutting
//! concerns to be handled in a composable way.
//!
//! ## Design
//!
//! ```text
//! Action → Middleware Chain → Reducer → State → Listeners
//! ```
//!
//! Each middleware wraps the next dispatch function in the chain: it can
//! inspect actions, pass them on, swallow them, or dispatch new actions
//! through the store facade. A dispatch issued through the facade re-enters
//! the whole chain, not just the stages downstream of the caller.

use crate::action::Action;
use crate::compose::{compose, ComposeFn};
use crate::error::StoreError;
use crate::reducer::{BoxFuture, Reducer, StateSlot};
use crate::store::{Dispatch, Enhancer, Store, StoreCreator, WeakStore};
use std::sync::Arc;

/// Facade handed to every middleware. Exposes exactly two capabilities:
/// reading the current state and dispatching through the store's current
/// dispatch function. All middleware of one store share a single facade.
#[derive(Clone)]
pub struct StoreApi {
    inner: Arc<StoreApiInner>,
}

struct StoreApiInner {
    store: WeakStore,
}

impl StoreApi {
    fn new(store: &Store) -> Self {
        Self {
            inner: Arc::new(StoreApiInner {
                store: store.downgrade(),
            }),
        }
    }

    /// Current state; `None` once every store handle has been dropped.
    pub fn state(&self) -> StateSlot {
        self.inner.store.upgrade().and_then(|store| store.state())
    }

    /// Dispatch through the store's current dispatch function, so an action
    /// issued by middleware re-enters the whole chain. The target is resolved
    /// when the future is created; a future created while the chain is still
    /// being assembled resolves to [`StoreError::MiddlewareSetup`].
    pub fn dispatch(&self, action: Action) -> BoxFuture<'static, Result<Action, StoreError>> {
        match self.inner.store.upgrade() {
            Some(store) => {
                let dispatch = store.current_dispatch();
                Box::pin(async move { dispatch(action).await })
            }
            None => Box::pin(async { Err(StoreError::StoreGone) }),
        }
    }

    /// Whether two handles refer to the same facade.
    pub fn ptr_eq(&self, other: &StoreApi) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Middleware - wraps the store's dispatch function.
///
/// `wrap` is the factory stage: it runs exactly once per store construction,
/// in registration order, receiving the shared store facade and the next
/// dispatch in the chain, and returns the dispatch stage for this middleware.
pub trait Middleware: Send + Sync {
    fn wrap(&self, api: StoreApi, next: Dispatch) -> Dispatch;
}

/// Build a store enhancer that installs the given middleware.
///
/// The first middleware in the list sees every dispatched action first; the
/// last sits directly above the store's base dispatch. While the chain is
/// being assembled the store's dispatch slot holds a guard that fails fast,
/// so middleware cannot route actions around a half-built chain.
pub fn apply_middleware(middlewares: Vec<Arc<dyn Middleware>>) -> Enhancer {
    Box::new(move |create: StoreCreator| -> StoreCreator {
        Box::new(
            move |reducer: Reducer, preloaded_state: StateSlot| -> BoxFuture<'static, Result<Store, StoreError>> {
                Box::pin(async move {
                    let store = create(reducer, preloaded_state).await?;

                    store.set_dispatch(Arc::new(
                        |_action: Action| -> BoxFuture<'static, Result<Action, StoreError>> {
                            Box::pin(async { Err(StoreError::MiddlewareSetup) })
                        },
                    ));

                    let api = StoreApi::new(&store);
                    let chain: Vec<ComposeFn<Dispatch>> = middlewares
                        .into_iter()
                        .map(|middleware| {
                            let api = api.clone();
                            Box::new(move |next: Dispatch| middleware.wrap(api.clone(), next))
                                as ComposeFn<Dispatch>
                        })
                        .collect();

                    let dispatch = compose(chain)(store.base_dispatch_fn());
                    store.set_dispatch(dispatch);
                    Ok(store)
                })
            },
        )
    })
}

/// LoggingMiddleware - logs every action that passes through the chain.
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggingMiddleware {
    fn wrap(&self, _api: StoreApi, next: Dispatch) -> Dispatch {
        Arc::new(
            move |action: Action| -> BoxFuture<'static, Result<Action, StoreError>> {
                let next = Arc::clone(&next);
                Box::pin(async move {
                    log::debug!("Action: {:?}", action);
                    next(action).await
                })
            },
        )
    }
}

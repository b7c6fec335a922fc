//! Reducer types and constructors.
//!
//! A reducer is a pure transition from `(state, action)` to the next state.
//! It may suspend (its future is awaited by the store) but must not have
//! observable side effects beyond computing the next state.

use crate::action::Action;
use crate::error::StoreError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// BoxFuture type alias for async handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A state slot.
///
/// `None` means no state has been produced yet, which is distinct from an
/// explicit `Value::Null`: a combined reducer treats `None` from a slice as a
/// configuration error, while `Null` is a legal slice value.
pub type StateSlot = Option<Arc<Value>>;

/// Reducer - pure `(state, action) -> next state` transition function.
///
/// The whole state is replaced on every dispatch; a reducer ignores an action
/// by returning the state it was given.
pub type Reducer =
    Arc<dyn Fn(StateSlot, Action) -> BoxFuture<'static, Result<StateSlot, StoreError>> + Send + Sync>;

/// Wrap a value into a populated state slot.
pub fn slot(value: impl Into<Value>) -> StateSlot {
    Some(Arc::new(value.into()))
}

/// Build a reducer from a synchronous closure.
pub fn from_fn<F>(f: F) -> Reducer
where
    F: Fn(StateSlot, &Action) -> Result<StateSlot, StoreError> + Send + Sync + 'static,
{
    Arc::new(
        move |state: StateSlot, action: Action| -> BoxFuture<'static, Result<StateSlot, StoreError>> {
            let result = f(state, &action);
            Box::pin(async move { result })
        },
    )
}

/// Build a reducer from an asynchronous closure.
pub fn from_async<F, Fut>(f: F) -> Reducer
where
    F: Fn(StateSlot, Action) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StateSlot, StoreError>> + Send + 'static,
{
    Arc::new(
        move |state: StateSlot, action: Action| -> BoxFuture<'static, Result<StateSlot, StoreError>> {
            Box::pin(f(state, action))
        },
    )
}

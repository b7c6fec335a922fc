//! uniflow - a minimal unidirectional state container
//!
//! One store holds the whole application state; the state only changes in
//! response to dispatched actions, computed by pure reducers and observed
//! through subscriptions:
//!
//! ```text
//! Action → Middleware Chain → Reducer → State → Listeners
//! ```
//!
//! The building blocks:
//! - [`create_store`] constructs the [`Store`], seeding state with one
//!   internal dispatch
//! - [`combine_reducers`] merges per-key slice reducers into one reducer
//! - [`apply_middleware`] produces an enhancer wiring a middleware chain
//!   around dispatch, composed with [`compose`]
//!
//! State is an [`Arc`]ed [`serde_json::Value`] replaced wholesale on every
//! dispatch; reducers may be asynchronous and their futures are awaited by
//! the store.
//!
//! # Example
//!
//! ```no_run
//! use uniflow::{create_store, reducer, Action, StateSlot, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), uniflow::StoreError> {
//! let counter = reducer::from_fn(|state: StateSlot, action: &Action| {
//!     let value = state.as_deref().and_then(Value::as_i64).unwrap_or(0);
//!     Ok(match action.kind() {
//!         "increment" => uniflow::slot(value + 1),
//!         "decrement" => uniflow::slot(value - 1),
//!         _ => uniflow::slot(value),
//!     })
//! });
//!
//! let store = create_store(counter, None, None).await?;
//! store.dispatch(Action::new("increment")).await?;
//! assert_eq!(store.state(), uniflow::slot(1));
//! # Ok(())
//! # }
//! ```
//!
//! [`Arc`]: std::sync::Arc

mod action;
mod combine;
mod compose;
mod error;
mod middleware;
mod observable;
pub mod reducer;
mod store;

pub use action::Action;
pub use combine::combine_reducers;
pub use compose::{compose, ComposeFn};
pub use error::StoreError;
pub use middleware::{apply_middleware, LoggingMiddleware, Middleware, StoreApi};
pub use observable::{ObservableSubscription, Observer, StateObservable};
pub use reducer::{slot, BoxFuture, Reducer, StateSlot};
pub use store::{create_store, Dispatch, Enhancer, Listener, Store, StoreCreator, Subscription};

// The state value type, re-exported for convenience.
pub use serde_json::Value;

//! Store errors.

use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Configuration errors fail fast and surface to the immediate caller; the
/// store never retries and never partially commits. Failures raised inside
/// caller-supplied reducers or middleware travel through [`StoreError::Other`]
/// unmodified.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Re-entrant dispatch: a reducer (or a second concurrent caller) tried
    /// to dispatch while a transition was already being computed.
    #[error("dispatch is not allowed while a reducer is executing")]
    DispatchInProgress,

    /// Dispatch attempted while the middleware chain was still being built.
    #[error("dispatch is not allowed before the middleware chain is fully constructed")]
    MiddlewareSetup,

    /// A dispatch function or subscription handle outlived its store.
    #[error("store has been dropped")]
    StoreGone,

    /// A slice reducer produced no state for the initialization action.
    #[error(
        "reducer for key \"{key}\" returned no state during initialization; \
         a slice reducer given no previous state must return its initial state \
         (return Value::Null to leave the slice intentionally empty)"
    )]
    UndefinedInitialSliceState { key: String },

    /// A slice reducer produced no state for a regular action.
    #[error(
        "given {action}, reducer for key \"{key}\" returned no state; \
         return the previous state to ignore an action \
         (return Value::Null to leave the slice intentionally empty)"
    )]
    UndefinedSliceState { key: String, action: String },

    /// Failure raised by a caller-supplied reducer or middleware.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

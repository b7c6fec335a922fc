//! Async counter demo.
//!
//! Drives a uniflow store from the console: a counter reducer with a
//! deliberately slow `increment-async` transition, a logging middleware, and
//! a subscription printing every committed value.

use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use uniflow::{
    apply_middleware, create_store, reducer, slot, Action, LoggingMiddleware, Reducer, StateSlot,
};

fn counter() -> Reducer {
    reducer::from_async(|state: StateSlot, action: Action| async move {
        let value = state.as_deref().and_then(Value::as_i64).unwrap_or(0);
        let next = match action.kind() {
            "increment" => value + 1,
            "increment-async" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                value + 1
            }
            "decrement" => value - 1,
            _ => value,
        };
        Ok(slot(next))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    log::info!("Starting uniflow-counter");

    let store = create_store(
        counter(),
        None,
        Some(apply_middleware(vec![Arc::new(LoggingMiddleware::new())])),
    )
    .await?;

    let render_store = store.clone();
    store.subscribe(move || {
        let store = render_store.clone();
        async move {
            if let Some(state) = store.state() {
                println!("counter = {state}");
            }
        }
    });

    store.dispatch(Action::new("increment")).await?;
    store.dispatch(Action::new("increment")).await?;
    store.dispatch(Action::new("decrement")).await?;

    log::info!("Dispatching increment-async");
    store.dispatch(Action::new("increment-async")).await?;

    log::info!("Exiting uniflow-counter");
    Ok(())
}

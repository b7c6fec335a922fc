//! Reducer combination.
//!
//! `combine_reducers` merges an ordered map of slice reducers into one
//! reducer over an object-shaped state, one key per slice. Each slice reducer
//! owns its key and never sees the rest of the state. Combined reducers nest:
//! a slice reducer can itself be the output of `combine_reducers`.

use crate::action::{self, Action};
use crate::error::StoreError;
use crate::reducer::{BoxFuture, Reducer, StateSlot};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Merge a slice map into a single reducer.
///
/// Entries with no reducer (`None`) are dropped at combination time with a
/// diagnostic naming the key; entry order becomes the key order of the
/// produced state object.
///
/// The returned reducer:
/// - runs every slice reducer in declaration order, awaiting each;
/// - fails with a configuration error when a slice produces no state;
/// - returns the input state object untouched (same `Arc`) when no slice
///   value changed, so consumers can detect changes cheaply;
/// - warns, at most once per offending key, when the incoming state carries
///   keys no slice owns. The warning never alters the returned state.
pub fn combine_reducers<I, K>(slices: I) -> Reducer
where
    I: IntoIterator<Item = (K, Option<Reducer>)>,
    K: Into<String>,
{
    let mut retained: Vec<(String, Reducer)> = Vec::new();
    for (key, entry) in slices {
        let key = key.into();
        match entry {
            Some(reducer) => retained.push((key, reducer)),
            None => log::warn!("No reducer provided for key \"{key}\""),
        }
    }

    let retained = Arc::new(retained);
    let warned: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

    Arc::new(
        move |state: StateSlot, action: Action| -> BoxFuture<'static, Result<StateSlot, StoreError>> {
            let retained = Arc::clone(&retained);
            let warned = Arc::clone(&warned);
            Box::pin(async move {
                if retained.is_empty() {
                    log::warn!(
                        "Store does not have a valid reducer. Make sure the slice map passed \
                         to combine_reducers contains at least one reducer entry."
                    );
                    return Ok(state.or_else(|| Some(Arc::new(Value::Object(Map::new())))));
                }

                warn_on_shape_mismatch(&state, &retained, &action, &warned);

                // Await every slice first, in declaration order; change
                // detection happens only after all slices have resolved.
                let mut resolved: Vec<(&String, StateSlot, Arc<Value>)> =
                    Vec::with_capacity(retained.len());
                for (key, reducer) in retained.iter() {
                    let prev: StateSlot = state
                        .as_deref()
                        .and_then(Value::as_object)
                        .and_then(|object| object.get(key))
                        .map(|value| Arc::new(value.clone()));
                    let next = reducer(prev.clone(), action.clone()).await?;
                    let next = next.ok_or_else(|| undefined_slice_error(key, &action))?;
                    resolved.push((key, prev, next));
                }

                let mut changed = false;
                let mut next_state = Map::with_capacity(resolved.len());
                for (key, prev, next) in resolved {
                    changed = changed || prev.as_deref() != Some(next.as_ref());
                    next_state.insert(key.clone(), next.as_ref().clone());
                }

                if changed || state.is_none() {
                    Ok(Some(Arc::new(Value::Object(next_state))))
                } else {
                    Ok(state)
                }
            })
        },
    )
}

fn undefined_slice_error(key: &str, action: &Action) -> StoreError {
    if action::is_internal(action.kind()) {
        StoreError::UndefinedInitialSliceState { key: key.to_string() }
    } else {
        StoreError::UndefinedSliceState {
            key: key.to_string(),
            action: action_description(action),
        }
    }
}

fn action_description(action: &Action) -> String {
    if action.kind().is_empty() {
        "an action".to_string()
    } else {
        format!("action \"{}\"", action.kind())
    }
}

// Non-fatal shape diagnostics. The cache keeps each offending key (or
// mismatched type) from warning more than once per combined reducer.
fn warn_on_shape_mismatch(
    state: &StateSlot,
    retained: &[(String, Reducer)],
    action: &Action,
    warned: &Mutex<HashSet<String>>,
) {
    let Some(state) = state.as_deref() else {
        return;
    };

    let argument = if action.kind() == action::init_kind() {
        "preloaded state passed to create_store"
    } else {
        "previous state received by the reducer"
    };
    let expected = quoted_list(retained.iter().map(|(key, _)| key.as_str()));

    match state {
        Value::Object(object) => {
            let mut cache = warned.lock().unwrap();
            let unexpected: Vec<String> = object
                .keys()
                .filter(|key| !retained.iter().any(|(known, _)| known == *key))
                .filter(|key| !cache.contains(*key))
                .cloned()
                .collect();
            if unexpected.is_empty() {
                return;
            }
            for key in &unexpected {
                cache.insert(key.clone());
            }
            let noun = if unexpected.len() > 1 { "keys" } else { "key" };
            let list = quoted_list(unexpected.iter().map(String::as_str));
            log::warn!(
                "Unexpected {noun} {list} found in the {argument}. Expected to find one of \
                 the known reducer keys instead: {expected}. Unexpected keys will be ignored."
            );
        }
        other => {
            let type_name = json_type_name(other);
            if warned.lock().unwrap().insert(format!("<type:{type_name}>")) {
                log::warn!(
                    "The {argument} has unexpected type \"{type_name}\". Expected an object \
                     with the following keys: {expected}."
                );
            }
        }
    }
}

fn quoted_list<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    keys.map(|key| format!("\"{key}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{from_async, from_fn, slot};
    use serde_json::json;
    use std::time::Duration;

    fn counter() -> Reducer {
        from_fn(|state: StateSlot, action: &Action| {
            let value = state.as_deref().and_then(Value::as_i64).unwrap_or(0);
            Ok(match action.kind() {
                "increment" => slot(value + 1),
                "decrement" => slot(value - 1),
                _ => slot(value),
            })
        })
    }

    fn stack() -> Reducer {
        from_fn(|state: StateSlot, action: &Action| {
            let mut items = state
                .as_deref()
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if action.kind() == "push" {
                items.push(action.payload().clone());
            }
            Ok(slot(items))
        })
    }

    // Returns its input unchanged, seeding an empty object.
    fn passthrough() -> Reducer {
        from_fn(|state: StateSlot, _action: &Action| Ok(state.or_else(|| slot(json!({})))))
    }

    #[tokio::test]
    async fn test_maps_state_keys_to_slice_reducers() {
        let reducer = combine_reducers(vec![
            ("counter", Some(counter())),
            ("stack", Some(stack())),
        ]);

        let s1 = reducer(slot(json!({})), Action::new("increment"))
            .await
            .unwrap();
        assert_eq!(s1.as_deref(), Some(&json!({ "counter": 1, "stack": [] })));

        let s2 = reducer(s1, Action::with_payload("push", json!("a")))
            .await
            .unwrap();
        assert_eq!(
            s2.as_deref(),
            Some(&json!({ "counter": 1, "stack": ["a"] }))
        );
    }

    #[tokio::test]
    async fn test_ignores_entries_without_a_reducer() {
        let reducer = combine_reducers(vec![
            ("fake", None),
            ("broken", None),
            ("stack", Some(stack())),
        ]);

        let state = reducer(slot(json!({})), Action::new("push")).await.unwrap();
        let keys: Vec<&String> = state
            .as_deref()
            .and_then(Value::as_object)
            .map(|object| object.keys().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["stack"]);
    }

    #[tokio::test]
    async fn test_preserves_entry_order_in_the_state_object() {
        let reducer = combine_reducers(vec![
            ("zebra", Some(passthrough())),
            ("apple", Some(passthrough())),
            ("mango", Some(passthrough())),
        ]);

        let state = reducer(None, crate::action::init()).await.unwrap();
        let keys: Vec<&String> = state
            .as_deref()
            .and_then(Value::as_object)
            .map(|object| object.keys().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[tokio::test]
    async fn test_errors_when_a_slice_yields_nothing_during_initialization() {
        // No default arm for missing state: yields None on the init action.
        let broken = from_fn(|state: StateSlot, _action: &Action| Ok(state));
        let reducer = combine_reducers(vec![("counter", Some(broken))]);

        let err = reducer(None, crate::action::init()).await.unwrap_err();
        match err {
            StoreError::UndefinedInitialSliceState { key } => assert_eq!(key, "counter"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_errors_when_a_slice_yields_nothing_for_a_regular_action() {
        let broken = from_fn(|state: StateSlot, action: &Action| {
            if action.kind() == "whatever" {
                Ok(None)
            } else {
                Ok(state.or_else(|| slot(0)))
            }
        });
        let reducer = combine_reducers(vec![("counter", Some(broken))]);

        let seeded = reducer(None, crate::action::init()).await.unwrap();
        let err = reducer(seeded, Action::new("whatever")).await.unwrap_err();
        match err {
            StoreError::UndefinedSliceState { key, action } => {
                assert_eq!(key, "counter");
                assert_eq!(action, "action \"whatever\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_describes_an_action_with_no_kind_generically() {
        let broken = from_fn(|_state: StateSlot, _action: &Action| Ok(None));
        let reducer = combine_reducers(vec![("counter", Some(broken))]);

        let err = reducer(slot(json!({})), Action::new("")).await.unwrap_err();
        match err {
            StoreError::UndefinedSliceState { action, .. } => assert_eq!(action, "an action"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_keeps_the_same_state_object_when_nothing_changed() {
        let reducer = combine_reducers(vec![
            ("child1", Some(passthrough())),
            ("child2", Some(passthrough())),
            ("child3", Some(passthrough())),
        ]);

        let initial = reducer(None, crate::action::init()).await.unwrap();
        let after = reducer(initial.clone(), Action::new("noop")).await.unwrap();
        assert!(Arc::ptr_eq(
            initial.as_ref().unwrap(),
            after.as_ref().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_returns_a_new_state_object_when_a_slice_changed() {
        let reducer = combine_reducers(vec![
            ("child1", Some(passthrough())),
            ("counter", Some(counter())),
        ]);

        let initial = reducer(None, crate::action::init()).await.unwrap();
        let after = reducer(initial.clone(), Action::new("increment"))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(
            initial.as_ref().unwrap(),
            after.as_ref().unwrap()
        ));
        assert_eq!(
            after.as_deref(),
            Some(&json!({ "child1": {}, "counter": 1 }))
        );
    }

    #[tokio::test]
    async fn test_empty_slice_map_returns_the_input_unchanged() {
        let reducer = combine_reducers(Vec::<(String, Option<Reducer>)>::new());

        let input = slot(json!({ "anything": 1 }));
        let output = reducer(input.clone(), Action::new("noop")).await.unwrap();
        assert!(Arc::ptr_eq(input.as_ref().unwrap(), output.as_ref().unwrap()));

        let seeded = reducer(None, Action::new("noop")).await.unwrap();
        assert_eq!(seeded.as_deref(), Some(&json!({})));
    }

    #[tokio::test]
    async fn test_unexpected_keys_are_ignored_but_preserved_when_unchanged() {
        let reducer = combine_reducers(vec![("counter", Some(counter()))]);

        let input = slot(json!({ "counter": 3, "legacy": true }));
        let output = reducer(input.clone(), Action::new("noop")).await.unwrap();
        // Nothing changed, so the unexpected key survives with the object.
        assert!(Arc::ptr_eq(input.as_ref().unwrap(), output.as_ref().unwrap()));

        let changed = reducer(input, Action::new("increment")).await.unwrap();
        assert_eq!(changed.as_deref(), Some(&json!({ "counter": 4 })));
    }

    #[tokio::test]
    async fn test_awaits_asynchronous_slices_in_order() {
        let slow_counter = from_async(|state: StateSlot, action: Action| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let value = state.as_deref().and_then(Value::as_i64).unwrap_or(0);
            Ok(slot(if action.kind() == "increment" {
                value + 1
            } else {
                value
            }))
        });
        let reducer = combine_reducers(vec![
            ("slow", Some(slow_counter)),
            ("stack", Some(stack())),
        ]);

        let seeded = reducer(None, crate::action::init()).await.unwrap();
        let next = reducer(seeded, Action::new("increment")).await.unwrap();
        assert_eq!(next.as_deref(), Some(&json!({ "slow": 1, "stack": [] })));
    }

    #[tokio::test]
    async fn test_combined_reducers_nest() {
        let inner = combine_reducers(vec![("counter", Some(counter()))]);
        let outer = combine_reducers(vec![
            ("nested", Some(inner)),
            ("stack", Some(stack())),
        ]);

        let seeded = outer(None, crate::action::init()).await.unwrap();
        assert_eq!(
            seeded.as_deref(),
            Some(&json!({ "nested": { "counter": 0 }, "stack": [] }))
        );

        let next = outer(seeded, Action::new("increment")).await.unwrap();
        assert_eq!(
            next.as_deref(),
            Some(&json!({ "nested": { "counter": 1 }, "stack": [] }))
        );
    }
}

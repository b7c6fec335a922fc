//! Actions and the reserved internal action types.
//!
//! An action is an opaque description of an intended state transition: a
//! `kind` discriminator plus an arbitrary JSON payload. The store consumes an
//! action once per dispatch and hands it to the reducer unchanged.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Action - describes an intended state transition.
///
/// The `kind` field is the conventional discriminator (serialized as
/// `"type"`); `payload` carries whatever data the reducer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl Action {
    /// Action with the given kind and no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Action carrying a payload.
    pub fn with_payload(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// The discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The payload; `Value::Null` when the action carries none.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

// Reserved action types. The suffix is random per process so application
// reducers cannot match on them; a reducer must fall through to its default
// arm, which is exactly what seeds initial slice state.
static INIT: LazyLock<String> = LazyLock::new(|| reserved("INIT"));
static REPLACE: LazyLock<String> = LazyLock::new(|| reserved("REPLACE"));

fn reserved(name: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7).map(|_| rng.sample(Alphanumeric) as char).collect();
    format!("@@uniflow/{name}{suffix}")
}

/// The one-time initialization action dispatched by `create_store`.
pub(crate) fn init() -> Action {
    Action::new(INIT.as_str())
}

/// The action dispatched after `replace_reducer` swaps the transition
/// function, so new slices can populate their keys.
pub(crate) fn replace() -> Action {
    Action::new(REPLACE.as_str())
}

pub(crate) fn init_kind() -> &'static str {
    INIT.as_str()
}

/// Whether the kind is one of the reserved internal action types.
pub(crate) fn is_internal(kind: &str) -> bool {
    kind == INIT.as_str() || kind == REPLACE.as_str()
}

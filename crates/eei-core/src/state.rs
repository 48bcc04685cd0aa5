//! Serializable payload state.
//!
//! Every payload keeps its editable fields in a plain serde struct. Export
//! serializes that struct into a JSON object; assignment writes one key at a
//! time and round-trips through serde so that types are checked exactly as
//! they are on load.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("unknown state key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for state key `{key}`: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("state does not serialize to a JSON object")]
    NotAnObject,
}

/// Serialize `state` into a key/value map.
///
/// State structs are flat records, so anything other than an object is a
/// programming error; it is logged and exported as an empty map.
pub fn export_state<T: Serialize>(state: &T) -> Map<String, Value> {
    match serde_json::to_value(state) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::error!("[state] {}", StateError::NotAnObject);
            Map::new()
        }
        Err(e) => {
            tracing::error!("[state] failed to export state: {e}");
            Map::new()
        }
    }
}

/// Assign a single key of `state`.
///
/// Keys that the struct does not export are rejected, as are values whose
/// type does not fit the field. On error `state` is left untouched.
pub fn assign_state<T>(state: &mut T, key: &str, value: &Value) -> Result<(), StateError>
where
    T: Serialize + DeserializeOwned,
{
    let mut map = match serde_json::to_value(&*state) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(StateError::NotAnObject),
        Err(source) => {
            return Err(StateError::InvalidValue {
                key: key.to_string(),
                source,
            });
        }
    };

    let Some(slot) = map.get_mut(key) else {
        return Err(StateError::UnknownKey(key.to_string()));
    };
    *slot = value.clone();

    let updated = serde_json::from_value(Value::Object(map)).map_err(|source| {
        StateError::InvalidValue {
            key: key.to_string(),
            source,
        }
    })?;
    *state = updated;
    Ok(())
}

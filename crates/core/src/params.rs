//! Helpers for building typed configs from partial JSON objects.
//!
//! Effect configs are nested serde structs whose defaults differ per field
//! (a `large` class profile is not a `tiny` one), so a partial object is
//! deep-merged over the serialized defaults before deserializing. Keys that
//! are absent keep their default; present keys replace it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::EngineError;

/// Recursively merges `patch` into `base`.
///
/// A top-level `null` patch leaves `base` unchanged. Below the top level,
/// objects merge key by key and any other value (including arrays and
/// `null`, which clears an optional field) replaces the base value outright.
pub fn merge_json(base: &mut Value, patch: &Value) {
    if !patch.is_null() {
        merge_value(base, patch);
    }
}

fn merge_value(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Serializes `base`, merges `patch` over it and deserializes the result.
///
/// `patch` must be a JSON object (or `null`, meaning no changes). Returns
/// `EngineError::InvalidConfig` if it is not, or if the merged value does not
/// fit the config type.
pub fn merge_config<T>(base: &T, patch: &Value) -> Result<T, EngineError>
where
    T: Serialize + DeserializeOwned,
{
    if !(patch.is_object() || patch.is_null()) {
        return Err(EngineError::InvalidConfig(format!(
            "expected a JSON object, got {patch}"
        )));
    }
    let mut merged =
        serde_json::to_value(base).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
    merge_json(&mut merged, patch);
    serde_json::from_value(merged).map_err(|e| EngineError::InvalidConfig(e.to_string()))
}

/// Builds a config from a partial JSON object merged over `T::default()`.
pub fn config_from_json<T>(patch: &Value) -> Result<T, EngineError>
where
    T: Serialize + DeserializeOwned + Default,
{
    merge_config(&T::default(), patch)
}

/// Serializes a config for `Effect::params`. Falls back to `null` on failure.
pub fn config_to_json<T: Serialize>(config: &T) -> Value {
    serde_json::to_value(config).unwrap_or(Value::Null)
}

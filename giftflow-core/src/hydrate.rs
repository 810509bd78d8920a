//! Defaults-backed hydration.
//!
//! Persisted and remote documents are untrusted: fields go missing between
//! schema revisions and operators hand-edit JSON. Hydration walks the serialized
//! default value of the target type and fills every missing or wrongly-typed
//! field from it, recursively, before deserializing. New fields added to a type's
//! `Default` are therefore picked up without touching this module.
//!
//! Kind checks cannot see inside optional slots, array elements or numeric
//! ranges. Fields of those shapes opt into [`or_default`] and
//! [`lenient_strings`] so a single bad leaf resets that leaf only.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Merge `raw` over `template`.
///
/// Objects merge key by key. A `null` template slot (an optional field) accepts
/// whatever `raw` holds. Any other slot keeps the raw value only when it has the
/// same JSON kind as the template; otherwise the template wins. Keys present only
/// in `raw` are carried through untouched.
#[must_use]
pub fn fill_missing(template: &Value, raw: &Value) -> Value {
    match (template, raw) {
        (Value::Object(defaults), Value::Object(given)) => {
            let mut merged = Map::with_capacity(defaults.len().max(given.len()));
            for (key, default_value) in defaults {
                let value = given.get(key).map_or_else(
                    || default_value.clone(),
                    |given_value| fill_missing(default_value, given_value),
                );
                merged.insert(key.clone(), value);
            }
            for (key, given_value) in given {
                if !defaults.contains_key(key) {
                    merged.insert(key.clone(), given_value.clone());
                }
            }
            Value::Object(merged)
        }
        (Value::Null, given) => given.clone(),
        (default_value, given) if same_kind(default_value, given) => given.clone(),
        (default_value, _) => default_value.clone(),
    }
}

const fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
    )
}

/// Hydrate `raw` into `T`, reporting the error when even the filled document
/// does not deserialize.
///
/// # Errors
///
/// Returns the deserialization error for documents that stay invalid after
/// filling, e.g. a number where an optional string belongs.
pub fn try_hydrate<T>(raw: &Value) -> Result<T, serde_json::Error>
where
    T: Default + Serialize + DeserializeOwned,
{
    let template = serde_json::to_value(T::default())?;
    serde_json::from_value(fill_missing(&template, raw))
}

/// Hydrate `raw` into `T`, degrading to `T::default()` instead of failing.
#[must_use]
pub fn hydrate<T>(raw: &Value) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    try_hydrate(raw).unwrap_or_else(|err| {
        log::warn!(
            "Hydration of {} fell back to defaults: {err}",
            std::any::type_name::<T>()
        );
        T::default()
    })
}

/// Parse and hydrate a stored blob; unparsable text yields defaults.
#[must_use]
pub fn hydrate_str<T>(raw: &str) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => hydrate(&value),
        Err(err) => {
            log::warn!(
                "Stored {} is not valid JSON, using defaults: {err}",
                std::any::type_name::<T>()
            );
            T::default()
        }
    }
}

/// `deserialize_with` helper for entity lists: each element is hydrated against
/// the element type's default, and elements that still fail are dropped instead
/// of failing the whole document.
///
/// # Errors
///
/// Only fails when the field is not an array at all, which hydration already
/// prevents for fields whose default is an array.
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Serialize + DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match try_hydrate::<T>(item) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!(
                    "Dropping malformed {} at index {index}: {err}",
                    std::any::type_name::<T>()
                );
                None
            }
        })
        .collect())
}

/// `deserialize_with` helper for a single leaf: a value that does not fit `T`
/// becomes `T::default()` instead of failing the enclosing struct.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|err| {
        log::warn!(
            "Resetting malformed {} field to its default: {err}",
            std::any::type_name::<T>()
        );
        T::default()
    }))
}

/// `deserialize_with` helper for string lists: non-string elements are dropped
/// and the rest kept in order.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all.
pub fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let Value::Array(items) = raw else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            other => {
                log::warn!("Dropping non-string list element {other}");
                None
            }
        })
        .collect())
}

//! String-keyed owner views used to resolve path templates.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

/// Snapshot of an owner's fields, keyed by field name.
pub type AttributeMap = BTreeMap<String, String>;

/// Exposes an owner's fields for path template resolution.
///
/// Called on every cache invocation, so the mapping always reflects the
/// owner's current state rather than its state when the cache was built.
pub trait Attributes {
    fn attributes(&self) -> AttributeMap;
}

impl Attributes for AttributeMap {
    fn attributes(&self) -> AttributeMap {
        self.clone()
    }
}

impl Attributes for HashMap<String, String> {
    fn attributes(&self) -> AttributeMap {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<T: Attributes + ?Sized> Attributes for &T {
    fn attributes(&self) -> AttributeMap {
        (**self).attributes()
    }
}

/// Derives an attribute view from any `Serialize` owner.
///
/// Only top-level scalar fields (strings, numbers, booleans) are exposed;
/// nested objects, arrays and nulls are skipped. An owner that does not
/// serialize to a JSON object yields an empty mapping.
pub struct SerializedAttributes<'a, T: ?Sized>(pub &'a T);

impl<T: Serialize + ?Sized> Attributes for SerializedAttributes<'_, T> {
    fn attributes(&self) -> AttributeMap {
        match serde_json::to_value(self.0) {
            Ok(Value::Object(fields)) => fields
                .into_iter()
                .filter_map(|(name, value)| scalar_to_string(&value).map(|s| (name, s)))
                .collect(),
            _ => AttributeMap::new(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Build an [`AttributeMap`] from `(name, value)` pairs.
pub fn attribute_map<I, K, V>(pairs: I) -> AttributeMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

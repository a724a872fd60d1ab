//! Immutable settings snapshots
//!
//! A snapshot is the complete set of current key/value pairs at a point in
//! time. The map lives behind an `Rc` so producing a modified snapshot is a
//! clone-on-write and rollback is a pointer swap, never a diff-undo. All
//! consumers outside the state manager hold read-only snapshot references.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::settings::value::SettingValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Rc<BTreeMap<String, SettingValue>>,
}

impl Snapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = (String, SettingValue)>) -> Self {
        Self {
            entries: Rc::new(entries.into_iter().collect()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// New snapshot with one entry replaced
    pub fn with(&self, key: impl Into<String>, value: SettingValue) -> Self {
        let mut map = (*self.entries).clone();
        map.insert(key.into(), value);
        Self {
            entries: Rc::new(map),
        }
    }

    /// New snapshot with all given entries merged over this one
    pub fn with_all(&self, entries: impl IntoIterator<Item = (String, SettingValue)>) -> Self {
        let mut map = (*self.entries).clone();
        map.extend(entries);
        Self {
            entries: Rc::new(map),
        }
    }

    /// True when both snapshots share the same underlying map
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }

    /// Hash of the entries whose key matches `relevant`.
    ///
    /// Used by the preview engine's section caches so unrelated field changes
    /// do not force a section regeneration.
    pub fn subset_hash(&self, relevant: impl Fn(&str) -> bool) -> u64 {
        let mut hasher = DefaultHasher::new();
        for (key, value) in self.entries.iter() {
            if relevant(key) {
                key.hash(&mut hasher);
                value.canonical().hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Keys whose value differs between `self` and `other`, in key order
    pub fn changed_keys(&self, other: &Snapshot) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for (key, value) in self.entries.iter() {
            if other.get(key) != Some(value) {
                keys.push(key.clone());
            }
        }
        for key in other.entries.keys() {
            if !self.entries.contains_key(key) {
                keys.push(key.clone());
            }
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Nested JSON object keyed by dotted-path segments (the wire format)
    pub fn to_nested_json(&self) -> Value {
        let mut root = Map::new();
        for (key, value) in self.entries.iter() {
            let mut node = &mut root;
            let mut segments = key.split('.').peekable();
            while let Some(segment) = segments.next() {
                if segments.peek().is_none() {
                    node.insert(segment.to_string(), to_json(value));
                } else {
                    let entry = node
                        .entry(segment.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if !entry.is_object() {
                        // A scalar key shadowing a deeper path; the deeper path wins
                        *entry = Value::Object(Map::new());
                    }
                    node = match entry {
                        Value::Object(map) => map,
                        _ => break,
                    };
                }
            }
        }
        Value::Object(root)
    }

    /// Flatten a nested (or already-dotted) JSON object into a snapshot.
    ///
    /// Non-scalar leaves (arrays, nulls) are skipped with a warning; the
    /// backend only stores scalars for theming keys.
    pub fn from_nested_json(value: &Value) -> Self {
        let mut entries = BTreeMap::new();
        if let Value::Object(map) = value {
            for (key, child) in map {
                flatten_into(&mut entries, key.clone(), child);
            }
        } else {
            warn!("settings payload is not a JSON object, ignoring");
        }
        Self {
            entries: Rc::new(entries),
        }
    }
}

fn to_json(value: &SettingValue) -> Value {
    match value {
        SettingValue::Toggle(b) => Value::Bool(*b),
        SettingValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SettingValue::Text(s) => Value::String(s.clone()),
    }
}

fn flatten_into(entries: &mut BTreeMap<String, SettingValue>, path: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(entries, format!("{path}.{key}"), child);
            }
        }
        Value::Bool(b) => {
            entries.insert(path, SettingValue::Toggle(*b));
        }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                entries.insert(path, SettingValue::Number(f));
            }
        }
        Value::String(s) => {
            entries.insert(path, SettingValue::text(s.as_str()));
        }
        Value::Array(_) | Value::Null => {
            warn!(key = %path, "skipping non-scalar settings value");
        }
    }
}

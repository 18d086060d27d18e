// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Opaque configuration trees.
//!
//! A [`Config`] describes one ingestion job. The controller never looks inside
//! it beyond the `type` discriminator: it only merges, unpacks and hashes it.
//!
//! # Hashing
//!
//! [`Config::hash`] serialises the tree in canonical form (object keys sorted
//! at every depth, no whitespace) and digests the bytes with FNV-1a 64. The
//! digest therefore only depends on the logical content, never on the order
//! in which keys were inserted.

use std::fmt;
use std::hash::Hasher;

use fnv::FnvHasher;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::TYPE_KEY;
use crate::errors::{Error, Result};

/// Deduplication key of a configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigHash(pub u64);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Mergeable, hashable settings tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(Value);

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Config(Value::Object(Map::new()))
    }

    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Config(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Unpacks the tree into a typed structure.
    pub fn unpack<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.0)?)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The `type` discriminator, if present and a string.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.get_str(TYPE_KEY)
    }

    /// Sets a top-level key. A non-map tree is replaced by a map first.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(key.into(), value.into());
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Deep merge of `other` into `self`.
    ///
    /// Nested maps are merged key by key; on any other conflict the value
    /// from `other` wins.
    pub fn merge(&mut self, other: &Config) {
        merge_values(&mut self.0, &other.0);
    }

    /// Canonical digest of the tree.
    pub fn hash(&self) -> Result<ConfigHash> {
        let mut buf = Vec::with_capacity(128);
        write_canonical(&self.0, &mut buf).map_err(|e| Error::Hash(e.to_string()))?;

        let mut hasher = FnvHasher::default();
        hasher.write(&buf);
        Ok(ConfigHash(hasher.finish()))
    }
}

impl From<Value> for Config {
    fn from(value: Value) -> Self {
        Config(value)
    }
}

impl From<Map<String, Value>> for Config {
    fn from(map: Map<String, Value>) -> Self {
        Config(Value::Object(map))
    }
}

fn merge_values(dst: &mut Value, src: &Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        dst.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> serde_json::Result<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (idx, (key, value)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(value, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Input {
        #[serde(rename = "type")]
        kind: String,
        paths: Vec<String>,
    }

    #[test]
    fn test_unpack_typed() {
        let config = Config::from_value(json!({"type": "log", "paths": ["/var/log/a.log"]}));
        let input: Input = config.unpack().expect("unpack failed");
        assert_eq!(input.kind, "log");
        assert_eq!(input.paths, vec!["/var/log/a.log".to_string()]);
    }

    #[test]
    fn test_unpack_wrong_shape() {
        let config = Config::from_value(json!({"type": 3}));
        assert!(matches!(config.unpack::<Input>(), Err(Error::Unpack(_))));
    }

    #[test]
    fn test_merge_deep() {
        let mut base = Config::from_value(json!({
            "type": "log",
            "fields": {"service": "web", "env": "dev"},
            "paths": ["/a"],
        }));
        let overlay = Config::from_value(json!({
            "fields": {"env": "prod", "team": "core"},
            "paths": ["/b"],
        }));

        base.merge(&overlay);

        assert_eq!(
            base.as_value(),
            &json!({
                "type": "log",
                "fields": {"service": "web", "env": "prod", "team": "core"},
                "paths": ["/b"],
            })
        );
    }

    #[test]
    fn test_merge_scalar_over_map() {
        let mut base = Config::from_value(json!({"fields": {"a": 1}}));
        base.merge(&Config::from_value(json!({"fields": "flat"})));
        assert_eq!(base.get_str("fields"), Some("flat"));
    }

    #[test]
    fn test_set_and_type_name() {
        let config = Config::new().with("type", "docker").with("enabled", true);
        assert_eq!(config.type_name(), Some("docker"));
        assert_eq!(config.get("enabled"), Some(&Value::Bool(true)));

        let mut scalar = Config::from_value(json!(42));
        scalar.set("type", "hints");
        assert_eq!(scalar.type_name(), Some("hints"));
    }

    #[test]
    fn test_hash_differs_on_content() {
        let a = Config::from_value(json!({"type": "log", "paths": ["/a"]}));
        let b = Config::from_value(json!({"type": "log", "paths": ["/b"]}));
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_hash_array_order_matters() {
        let a = Config::from_value(json!({"paths": ["/a", "/b"]}));
        let b = Config::from_value(json!({"paths": ["/b", "/a"]}));
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_hash_display() {
        assert_eq!(ConfigHash(0xbeef).to_string(), "000000000000beef");
    }

    #[test]
    fn test_canonical_form_sorts_keys_at_every_depth() {
        let mut outer = Map::new();
        outer.insert("type".into(), json!("log"));
        outer.insert("fields".into(), json!({"z": 1, "a": [{"y": 2, "b": 3}]}));
        assert_eq!(
            outer.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["type", "fields"]
        );

        let mut buf = Vec::new();
        write_canonical(&Value::Object(outer), &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            r#"{"fields":{"a":[{"b":3,"y":2}],"z":1},"type":"log"}"#
        );
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let mut forward = Map::new();
        forward.insert("a".into(), json!(1));
        forward.insert("z".into(), json!({"m": true, "b": false}));
        let mut backward = Map::new();
        backward.insert("z".into(), json!({"b": false, "m": true}));
        backward.insert("a".into(), json!(1));

        let forward = Config::from(forward);
        let backward = Config::from(backward);
        assert_ne!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );
        assert_eq!(forward.hash().unwrap(), backward.hash().unwrap());
    }

    fn build(entries: &[(String, i64)], nested: bool) -> Config {
        let mut map = Map::new();
        for (key, value) in entries {
            let value = if nested {
                json!({"inner": value, "key": key})
            } else {
                json!(value)
            };
            map.insert(key.clone(), value);
        }
        Config::from(map)
    }

    proptest! {
        #[test]
        fn prop_hash_ignores_insertion_order(
            entries in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..16),
            nested in any::<bool>(),
        ) {
            let forward: Vec<(String, i64)> = entries.clone().into_iter().collect();
            let mut backward = forward.clone();
            backward.reverse();

            let a = build(&forward, nested);
            let b = build(&backward, nested);
            if forward.len() > 1 {
                prop_assert_ne!(
                    serde_json::to_string(&a).unwrap(),
                    serde_json::to_string(&b).unwrap()
                );
            }
            prop_assert_eq!(a.hash().unwrap(), b.hash().unwrap());
        }
    }
}

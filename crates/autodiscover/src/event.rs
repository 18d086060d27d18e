// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Discovery events.
//!
//! An [`Event`] is a loose map of dynamically typed values produced by a
//! provider. Every accessor fails closed: a missing key and a key holding the
//! wrong kind of value both yield `None`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::constants::{CONFIG_KEY, META_KEY, START_KEY, STOP_KEY};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Event(Map::new())
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// True if every key is present, whatever its value.
    #[must_use]
    pub fn contains_all<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        keys.iter().all(|key| self.0.contains_key(key.as_ref()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    #[must_use]
    pub fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Walks a dotted path (`kubernetes.labels.app`) through nested maps.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        self.contains_key(START_KEY)
    }

    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.contains_key(STOP_KEY)
    }

    /// Candidate configurations carried under `config`.
    ///
    /// A single map is accepted as a one-element list.
    #[must_use]
    pub fn configs(&self) -> Option<Vec<Config>> {
        match self.get(CONFIG_KEY)? {
            Value::Array(items) => Some(items.iter().cloned().map(Config::from).collect()),
            value @ Value::Object(_) => Some(vec![Config::from(value.clone())]),
            _ => None,
        }
    }

    pub fn set_configs(&mut self, configs: Vec<Config>) {
        let list = configs.into_iter().map(Config::into_value).collect();
        self.0.insert(CONFIG_KEY.to_string(), Value::Array(list));
    }

    /// The `meta` map, if present and a map.
    #[must_use]
    pub fn meta(&self) -> Option<&Map<String, Value>> {
        self.get_map(META_KEY)
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Event(map)
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Predicates gating appenders.
//!
//! ```yaml
//! condition:
//!   and:
//!     - equals: { kubernetes.namespace: "prod" }
//!     - has_fields: ["kubernetes.labels.app"]
//!     - not: { contains: { kubernetes.container.image: "debug" } }
//! ```
//!
//! Paths are dotted lookups into the event (see [`Event::lookup`]).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::event::Event;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Every path holds exactly the given value.
    Equals(BTreeMap<String, Value>),
    /// Every path holds a string containing the given substring.
    Contains(BTreeMap<String, String>),
    /// Every path is present.
    HasFields(Vec<String>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Condition::Equals(expected) => expected
                .iter()
                .all(|(path, value)| event.lookup(path) == Some(value)),
            Condition::Contains(expected) => expected.iter().all(|(path, needle)| {
                event
                    .lookup(path)
                    .and_then(Value::as_str)
                    .is_some_and(|haystack| haystack.contains(needle.as_str()))
            }),
            Condition::HasFields(paths) => paths.iter().all(|path| event.lookup(path).is_some()),
            Condition::And(conditions) => conditions.iter().all(|c| c.matches(event)),
            Condition::Or(conditions) => conditions.iter().any(|c| c.matches(event)),
            Condition::Not(condition) => !condition.matches(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn event() -> Event {
        Event::new().with(
            "kubernetes",
            json!({
                "namespace": "prod",
                "labels": {"app": "web"},
                "container": {"image": "nginx:1.25"},
                "replicas": 3,
            }),
        )
    }

    fn parse(value: Value) -> Condition {
        Config::from_value(value).unpack().expect("condition should parse")
    }

    #[test]
    fn test_equals() {
        assert!(parse(json!({"equals": {"kubernetes.namespace": "prod"}})).matches(&event()));
        assert!(parse(json!({"equals": {"kubernetes.replicas": 3}})).matches(&event()));
        assert!(!parse(json!({"equals": {"kubernetes.namespace": "dev"}})).matches(&event()));
        assert!(!parse(json!({"equals": {"missing": "x"}})).matches(&event()));
    }

    #[test]
    fn test_contains_and_has_fields() {
        let image = parse(json!({"contains": {"kubernetes.container.image": "nginx"}}));
        assert!(image.matches(&event()));
        assert!(!parse(json!({"contains": {"kubernetes.replicas": "3"}})).matches(&event()));
        assert!(parse(json!({"has_fields": ["kubernetes.labels.app"]})).matches(&event()));
        assert!(!parse(json!({"has_fields": ["kubernetes.labels.tier"]})).matches(&event()));
    }

    #[test]
    fn test_combinators() {
        let condition = parse(json!({
            "and": [
                {"equals": {"kubernetes.namespace": "prod"}},
                {"not": {"contains": {"kubernetes.container.image": "debug"}}},
                {"or": [
                    {"has_fields": ["kubernetes.labels.tier"]},
                    {"equals": {"kubernetes.labels.app": "web"}},
                ]},
            ]
        }));
        assert!(condition.matches(&event()));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = Config::from_value(json!({"regexp": {"a": "b"}})).unpack::<Condition>();
        assert!(result.is_err());
    }
}

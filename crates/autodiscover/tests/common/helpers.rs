// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use autodiscover::{Config, Event};
use serde_json::Value;
use std::time::Duration;

/// Polls `condition` until it holds or one second has passed.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn config(value: Value) -> Config {
    Config::from_value(value)
}

pub fn start_event(configs: Vec<Config>) -> Event {
    let mut event = Event::new().with("start", true);
    event.set_configs(configs);
    event
}

pub fn stop_event(configs: Vec<Config>) -> Event {
    let mut event = Event::new().with("stop", true);
    event.set_configs(configs);
    event
}

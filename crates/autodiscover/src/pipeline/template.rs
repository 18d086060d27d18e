// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::event::Event;

/// Final pipeline stage: substitutes event-derived variables
/// (`${data.host}`, ...) into the candidates.
pub trait Template: Send + Sync {
    fn apply(&self, configs: Vec<Config>, event: &Event) -> Vec<Config>;
}

/// Identity template, for pipelines without variable substitution.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Template for PassThrough {
    fn apply(&self, configs: Vec<Config>, _event: &Event) -> Vec<Config> {
        configs
    }
}

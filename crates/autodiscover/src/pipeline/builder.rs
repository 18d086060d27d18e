// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::Config;
use crate::constants::{HINTS_BUILDER, TYPE_KEY};
use crate::errors::{Error, Result};
use crate::event::Event;
use crate::registry::Registry;

/// Derives candidate configurations from an event's hints.
///
/// Builders have no side effects. A builder with nothing to say returns an
/// empty list.
pub trait Builder: Send + Sync {
    fn create_config(&self, event: &Event) -> Vec<Config>;
}

pub type BuilderFactory = Arc<dyn Fn(&Config) -> Result<Box<dyn Builder>> + Send + Sync>;

/// Ordered set of builders.
#[derive(Default)]
pub struct Builders {
    builders: Vec<Box<dyn Builder>>,
}

impl Builders {
    /// Instantiates the listed builders, or the single implicit `hints`
    /// builder when `hints_enabled` is set.
    ///
    /// `hints_defaults` is merged into the implicit builder spec, so a hints
    /// builder can receive its default configuration.
    pub fn new(
        registry: &Registry,
        configs: &[Config],
        hints_enabled: bool,
        hints_defaults: Option<&Config>,
    ) -> Result<Self> {
        if hints_enabled {
            if !configs.is_empty() {
                return Err(Error::HintsWithBuilders);
            }

            let mut spec = Config::new();
            if let Some(defaults) = hints_defaults {
                spec.merge(defaults);
            }
            spec.set(TYPE_KEY, HINTS_BUILDER);

            debug!("Hints enabled, installing the '{}' builder", HINTS_BUILDER);
            return Ok(Builders {
                builders: vec![registry.build_builder(&spec)?],
            });
        }

        let builders = configs
            .iter()
            .map(|spec| registry.build_builder(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Builders { builders })
    }

    #[must_use]
    pub fn from_builders(builders: Vec<Box<dyn Builder>>) -> Self {
        Builders { builders }
    }

    /// Runs every builder in order and concatenates their output.
    #[must_use]
    pub fn get_config(&self, event: &Event) -> Vec<Config> {
        let mut configs = Vec::new();
        for (idx, builder) in self.builders.iter().enumerate() {
            let built = builder.create_config(event);
            if built.is_empty() {
                trace!(builder = idx, "Builder produced no config");
                continue;
            }
            configs.extend(built);
        }
        configs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::constants::CONFIG_APPENDER;
use crate::errors::Result;
use crate::event::Event;
use crate::pipeline::condition::Condition;
use crate::registry::Registry;

/// Enriches the candidate list stored under the event `config` key.
///
/// Appenders may rewrite candidates but never drop them.
pub trait Appender: Send + Sync {
    fn append(&self, event: &mut Event);
}

pub type AppenderFactory = Arc<dyn Fn(&Config) -> Result<Box<dyn Appender>> + Send + Sync>;

/// Ordered set of appenders.
#[derive(Default)]
pub struct Appenders {
    appenders: Vec<Box<dyn Appender>>,
}

impl Appenders {
    pub fn new(registry: &Registry, configs: &[Config]) -> Result<Self> {
        let appenders = configs
            .iter()
            .map(|spec| registry.build_appender(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Appenders { appenders })
    }

    #[must_use]
    pub fn from_appenders(appenders: Vec<Box<dyn Appender>>) -> Self {
        Appenders { appenders }
    }

    pub fn append(&self, event: &mut Event) {
        for appender in &self.appenders {
            appender.append(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.appenders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.appenders.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ConfigAppenderSpec {
    #[serde(default)]
    condition: Option<Condition>,
    config: Config,
}

/// Merges a fixed config into every candidate, optionally behind a
/// [`Condition`].
///
/// ```yaml
/// appenders:
///   - type: config
///     condition:
///       equals: { kubernetes.namespace: "prod" }
///     config:
///       fields: { env: "production" }
/// ```
#[derive(Debug)]
pub struct ConfigAppender {
    condition: Option<Condition>,
    config: Config,
}

impl ConfigAppender {
    pub fn from_spec(spec: &Config) -> Result<Self> {
        let spec: ConfigAppenderSpec = spec.unpack()?;
        Ok(ConfigAppender {
            condition: spec.condition,
            config: spec.config,
        })
    }
}

impl Appender for ConfigAppender {
    fn append(&self, event: &mut Event) {
        let Some(mut configs) = event.configs() else {
            debug!("No config list on event, skipping config appender");
            return;
        };

        if let Some(condition) = &self.condition {
            if !condition.matches(event) {
                return;
            }
        }

        for config in &mut configs {
            config.merge(&self.config);
        }
        event.set_configs(configs);
    }
}

/// Registers the appenders shipped with this crate.
pub fn register_builtin_appenders(registry: &Registry) -> Result<()> {
    registry.add_appender(CONFIG_APPENDER, |spec: &Config| -> Result<Box<dyn Appender>> {
        Ok(Box::new(ConfigAppender::from_spec(spec)?))
    })
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Event → configuration pipeline.
//!
//! ```text
//! Event ──> Builders ──> event["config"] ──> Appenders ──> Template ──> Vec<Config>
//! ```
//!
//! Providers run the pipeline on each discovery before publishing, so the
//! controller only ever sees finished candidates.

pub mod appender;
pub mod builder;
pub mod condition;
pub mod template;

pub use appender::{
    register_builtin_appenders, Appender, AppenderFactory, Appenders, ConfigAppender,
};
pub use builder::{Builder, BuilderFactory, Builders};
pub use condition::Condition;
pub use template::{PassThrough, Template};

use crate::config::Config;
use crate::errors::Result;
use crate::event::Event;
use crate::registry::Registry;
use crate::settings::PipelineSettings;

pub struct Pipeline {
    builders: Builders,
    appenders: Appenders,
    template: Box<dyn Template>,
}

impl Pipeline {
    #[must_use]
    pub fn new(builders: Builders, appenders: Appenders, template: Box<dyn Template>) -> Self {
        Pipeline {
            builders,
            appenders,
            template,
        }
    }

    /// Builds builders and appenders from settings, with a pass-through
    /// template stage.
    pub fn from_settings(registry: &Registry, settings: &PipelineSettings) -> Result<Self> {
        let builders = Builders::new(
            registry,
            &settings.builders,
            settings.hints.enabled,
            settings.hints.default_config.as_ref(),
        )?;
        let appenders = Appenders::new(registry, &settings.appenders)?;
        Ok(Pipeline::new(builders, appenders, Box::new(PassThrough)))
    }

    #[must_use]
    pub fn with_template(mut self, template: Box<dyn Template>) -> Self {
        self.template = template;
        self
    }

    /// Runs the three stages and leaves the final list in `event["config"]`.
    pub fn configs(&self, event: &mut Event) -> Vec<Config> {
        let built = self.builders.get_config(event);
        event.set_configs(built);

        self.appenders.append(event);

        let appended = event.configs().unwrap_or_default();
        let configs = self.template.apply(appended, event);
        event.set_configs(configs.clone());
        configs
    }

    #[must_use]
    pub fn builders(&self) -> &Builders {
        &self.builders
    }

    #[must_use]
    pub fn appenders(&self) -> &Appenders {
        &self.appenders
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Settings for the controller and the provider pipelines.
//!
//! ## Sources
//!
//! Applied in order, later sources override earlier ones:
//!
//! 1. **Defaults**
//! 2. **YAML file** passed to [`AutodiscoverSettings::load`]
//! 3. **Environment variables** prefixed with `AUTODISCOVER_`
//!    (`AUTODISCOVER_LOG_LEVEL=debug`; `__` separates nested keys)
//!
//! ```yaml
//! log_level: info
//! providers:
//!   - type: kubernetes
//!     hints:
//!       enabled: true
//!   - type: docker
//!     builders:
//!       - type: static
//!     appenders:
//!       - type: config
//!         config: { fields: { env: prod } }
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::logger::{self, LogLevel};

const ENV_PREFIX: &str = "AUTODISCOVER_";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AutodiscoverSettings {
    /// Provider specs, each selected by its `type`.
    pub providers: Vec<Config>,
    pub log_level: LogLevel,
}

impl AutodiscoverSettings {
    /// Loads defaults, then `path`, then the environment.
    ///
    /// A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self> {
        let settings: AutodiscoverSettings = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| Error::Settings(format!("failed to parse settings: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Settings embedded in a larger config tree.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings: AutodiscoverSettings = config.unpack()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Installs the global log subscriber at the configured level.
    pub fn init_logging(&self) -> Result<()> {
        logger::init(self.log_level)
    }

    pub fn validate(&self) -> Result<()> {
        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.type_name() {
                Some(name) if !name.trim().is_empty() => {}
                _ => {
                    return Err(Error::Settings(format!(
                        "provider #{idx} must have a non-empty `type`"
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Pipeline section of a provider spec.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub builders: Vec<Config>,
    pub appenders: Vec<Config>,
    pub hints: HintsSettings,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HintsSettings {
    pub enabled: bool,
    /// Merged into the implicit hints builder spec.
    pub default_config: Option<Config>,
}

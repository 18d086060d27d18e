// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Named factories for the three extension points.
//!
//! One [`Registry`] is created per composition root, filled at wiring time
//! and shared (`Arc<Registry>`) with the controller and the pipeline. Lookups
//! ignore case and surrounding whitespace; registering a name twice is an
//! error and keeps the first factory.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::adapter::{Provider, ProviderFactory};
use crate::bus::Bus;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::pipeline::{Appender, AppenderFactory, Builder, BuilderFactory};

const PROVIDER: &str = "provider";
const BUILDER: &str = "builder";
const APPENDER: &str = "appender";

struct Factories<F> {
    kind: &'static str,
    entries: HashMap<String, F>,
}

impl<F: Clone> Factories<F> {
    fn new(kind: &'static str) -> Self {
        Factories {
            kind,
            entries: HashMap::new(),
        }
    }

    fn add(&mut self, name: &str, factory: F) -> Result<()> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(Error::EmptyName { kind: self.kind });
        }
        if self.entries.contains_key(&name) {
            return Err(Error::AlreadyRegistered {
                kind: self.kind,
                name,
            });
        }
        debug!("Registered autodiscover {} '{}'", self.kind, name);
        self.entries.insert(name, factory);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<F> {
        self.entries.get(&normalize(name)).cloned()
    }

    fn resolve(&self, config: &Config) -> Result<F> {
        let name = config
            .type_name()
            .ok_or(Error::MissingType { kind: self.kind })?;
        self.get(name).ok_or_else(|| Error::UnknownType {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

struct State {
    providers: Factories<ProviderFactory>,
    builders: Factories<BuilderFactory>,
    appenders: Factories<AppenderFactory>,
}

pub struct Registry {
    state: RwLock<State>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Registry")
            .field("providers", &state.providers.names())
            .field("builders", &state.builders.names())
            .field("appenders", &state.appenders.names())
            .finish()
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry {
            state: RwLock::new(State {
                providers: Factories::new(PROVIDER),
                builders: Factories::new(BUILDER),
                appenders: Factories::new(APPENDER),
            }),
        }
    }

    pub fn add_provider<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(Bus, &Config) -> Result<Box<dyn Provider>> + Send + Sync + 'static,
    {
        self.write().providers.add(name, Arc::new(factory))
    }

    pub fn add_builder<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(&Config) -> Result<Box<dyn Builder>> + Send + Sync + 'static,
    {
        self.write().builders.add(name, Arc::new(factory))
    }

    pub fn add_appender<F>(&self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(&Config) -> Result<Box<dyn Appender>> + Send + Sync + 'static,
    {
        self.write().appenders.add(name, Arc::new(factory))
    }

    #[must_use]
    pub fn get_provider(&self, name: &str) -> Option<ProviderFactory> {
        self.read().providers.get(name)
    }

    #[must_use]
    pub fn get_builder(&self, name: &str) -> Option<BuilderFactory> {
        self.read().builders.get(name)
    }

    #[must_use]
    pub fn get_appender(&self, name: &str) -> Option<AppenderFactory> {
        self.read().appenders.get(name)
    }

    /// Builds the provider selected by the config `type` field.
    pub fn build_provider(&self, bus: Bus, config: &Config) -> Result<Box<dyn Provider>> {
        // The lock is released before the factory runs.
        let factory = self.read().providers.resolve(config)?;
        factory(bus, config)
    }

    pub fn build_builder(&self, config: &Config) -> Result<Box<dyn Builder>> {
        let factory = self.read().builders.resolve(config)?;
        factory(config)
    }

    pub fn build_appender(&self, config: &Config) -> Result<Box<dyn Appender>> {
        let factory = self.read().appenders.resolve(config)?;
        factory(config)
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.read().providers.names()
    }

    #[must_use]
    pub fn builder_names(&self) -> Vec<String> {
        self.read().builders.names()
    }

    #[must_use]
    pub fn appender_names(&self) -> Vec<String> {
        self.read().appenders.names()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Seams to the collaborators that live outside this crate.
//!
//! - [`Provider`]: watches some infrastructure and publishes events
//! - [`Adapter`]: turns events into configurations and configurations into
//!   runners, for one ingestion family
//! - [`Runner`]: a started ingestion worker

use std::fmt;
use std::sync::Arc;

use crate::bus::Bus;
use crate::config::Config;
use crate::constants::CONFIG_KEY;
use crate::errors::{Error, Result};
use crate::event::Event;
use crate::meta::MetaCell;

/// Long-lived event source. Owns its own tasks.
pub trait Provider: Send + Sync + fmt::Display {
    fn start(&self);
    fn stop(&self);
}

/// Handle on a started ingestion worker.
///
/// `start`/`stop` are fire-and-forget; the runner deals with its own
/// concurrency.
pub trait Runner: Send + Sync + fmt::Display {
    fn start(&self);
    fn stop(&self);
}

pub type ProviderFactory =
    Arc<dyn Fn(Bus, &Config) -> Result<Box<dyn Provider>> + Send + Sync>;

/// Bridges discovery events to a concrete ingestion family.
pub trait Adapter: Send + Sync {
    /// Candidate configurations for an event.
    fn create_config(&self, event: &Event) -> Result<Vec<Config>>;

    /// Validates a candidate without side effects.
    fn check_config(&self, config: &Config) -> Result<()>;

    /// Instantiates (but does not start) a runner. `meta` stays shared with
    /// the controller for in-place refreshes.
    fn create(&self, config: &Config, meta: MetaCell) -> Result<Box<dyn Runner>>;

    /// Keys an event must carry to reach this adapter.
    fn event_filter(&self) -> Vec<String>;
}

/// Builds runners from configurations.
pub trait RunnerFactory: Send + Sync {
    fn create(&self, config: &Config, meta: MetaCell) -> Result<Box<dyn Runner>>;

    fn check_config(&self, config: &Config) -> Result<()>;
}

/// [`Adapter`] reading candidates from the event `config` key and
/// delegating everything else to a [`RunnerFactory`].
pub struct FactoryAdapter<F> {
    factory: F,
}

impl<F: RunnerFactory> FactoryAdapter<F> {
    pub fn new(factory: F) -> Self {
        FactoryAdapter { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: RunnerFactory> Adapter for FactoryAdapter<F> {
    fn create_config(&self, event: &Event) -> Result<Vec<Config>> {
        event.configs().ok_or(Error::MissingConfigs)
    }

    fn check_config(&self, config: &Config) -> Result<()> {
        self.factory.check_config(config)
    }

    fn create(&self, config: &Config, meta: MetaCell) -> Result<Box<dyn Runner>> {
        self.factory.create(config, meta)
    }

    fn event_filter(&self) -> Vec<String> {
        vec![CONFIG_KEY.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopRunner;

    impl fmt::Display for NoopRunner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "noop")
        }
    }

    impl Runner for NoopRunner {
        fn start(&self) {}
        fn stop(&self) {}
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl RunnerFactory for CountingFactory {
        fn create(&self, _config: &Config, _meta: MetaCell) -> Result<Box<dyn Runner>> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoopRunner))
        }

        fn check_config(&self, config: &Config) -> Result<()> {
            match config.type_name() {
                Some(_) => Ok(()),
                None => Err(anyhow::anyhow!("config has no type").into()),
            }
        }
    }

    #[test]
    fn test_factory_adapter_reads_config_key() {
        let adapter = FactoryAdapter::new(CountingFactory::default());
        let mut event = Event::new().with("start", true);
        assert!(matches!(
            adapter.create_config(&event),
            Err(Error::MissingConfigs)
        ));

        event.set_configs(vec![Config::new().with("type", "log")]);
        let configs = adapter.create_config(&event).expect("configs expected");
        assert_eq!(configs.len(), 1);
        assert_eq!(adapter.event_filter(), vec!["config".to_string()]);
    }

    #[test]
    fn test_factory_adapter_delegates() {
        let adapter = FactoryAdapter::new(CountingFactory::default());
        assert!(adapter.check_config(&Config::new()).is_err());
        assert!(adapter
            .check_config(&Config::new().with("type", "log"))
            .is_ok());

        let runner = adapter
            .create(&Config::new(), MetaCell::default())
            .expect("runner expected");
        assert_eq!(runner.to_string(), "noop");
        assert_eq!(adapter.factory().created.load(Ordering::SeqCst), 1);
    }
}

// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The autodiscover controller.
//!
//! Per configuration hash the controller moves between two states:
//!
//! ```text
//!            start (new hash)                 stop
//!   absent ────────────────────> running ────────────> absent
//!                                  │  ▲
//!                                  └──┘ start (same hash): meta refresh only
//! ```
//!
//! A single worker task consumes the bus listener, so the
//! check-then-create sequence on [`Runners`] never races with itself.
//! Failures are isolated per event and per candidate: they are logged and the
//! worker moves on. The next matching discovery event is the recovery path.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::adapter::{Adapter, Provider, Runner};
use crate::bus::{Bus, Listener};
use crate::errors::{Error, Result};
use crate::event::Event;
use crate::meta::MetaStore;
use crate::registry::Registry;
use crate::runners::Runners;
use crate::settings::AutodiscoverSettings;

pub struct Autodiscover {
    name: String,
    bus: Bus,
    adapter: Arc<dyn Adapter>,
    providers: Vec<Box<dyn Provider>>,
    runners: Arc<Runners>,
    meta: Arc<MetaStore>,
    shutdown_token: CancellationToken,
    runtime: Handle,
    worker: Option<JoinHandle<()>>,
}

impl Autodiscover {
    /// Creates the controller bus and builds every configured provider.
    ///
    /// Must be called from within a Tokio runtime; the worker is later
    /// spawned on that runtime.
    pub fn new(
        name: impl Into<String>,
        registry: &Registry,
        adapter: Arc<dyn Adapter>,
        settings: &AutodiscoverSettings,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let name = name.into();
        let bus = Bus::new(name.clone());

        let mut providers = Vec::with_capacity(settings.providers.len());
        for spec in &settings.providers {
            let provider = registry.build_provider(bus.clone(), spec)?;
            debug!("Configured autodiscover provider: {}", provider);
            providers.push(provider);
        }

        Ok(Autodiscover {
            name,
            bus,
            adapter,
            providers,
            runners: Arc::new(Runners::new()),
            meta: Arc::new(MetaStore::new()),
            shutdown_token: CancellationToken::new(),
            runtime,
            worker: None,
        })
    }

    /// Subscribes to the bus, starts the providers and spawns the worker.
    ///
    /// Calling it twice is a no-op.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            warn!("Autodiscover '{}' is already started", self.name);
            return;
        }

        info!(
            "Starting autodiscover manager '{}' with {} providers",
            self.name,
            self.providers.len()
        );

        let listener = self.bus.subscribe(self.adapter.event_filter());

        for provider in &self.providers {
            debug!("Starting provider {}", provider);
            provider.start();
        }

        let worker = Worker {
            adapter: Arc::clone(&self.adapter),
            runners: Arc::clone(&self.runners),
            meta: Arc::clone(&self.meta),
        };
        let shutdown_token = self.shutdown_token.clone();
        let span = info_span!("autodiscover", name = %self.name);
        self.worker = Some(
            self.runtime
                .spawn(worker.run(listener, shutdown_token).instrument(span)),
        );
    }

    /// Stops delivery, then the providers, then every live runner.
    ///
    /// Waits for the event being processed, if any, to finish first.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            debug!("Autodiscover '{}' is not running", self.name);
            return;
        };

        info!("Stopping autodiscover manager '{}'", self.name);
        self.shutdown_token.cancel();
        if let Err(e) = worker.await {
            error!("Autodiscover worker failed: {}", e);
        }

        for provider in &self.providers {
            debug!("Stopping provider {}", provider);
            provider.stop();
        }

        let stopped = self.runners.stop_all();
        self.meta.clear();
        self.shutdown_token = CancellationToken::new();

        info!(
            "Stopped autodiscover manager '{}' ({} runners stopped)",
            self.name,
            stopped.len()
        );
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bus providers publish to.
    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub fn runners(&self) -> Arc<Runners> {
        Arc::clone(&self.runners)
    }

    #[must_use]
    pub fn meta(&self) -> Arc<MetaStore> {
        Arc::clone(&self.meta)
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for Autodiscover {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Lifecycle calls on a controller that may not have been configured.
///
/// `start`/`stop` on `None` do nothing.
pub trait OptionalAutodiscover {
    fn start(&mut self);

    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

impl OptionalAutodiscover for Option<Autodiscover> {
    fn start(&mut self) {
        if let Some(autodiscover) = self {
            autodiscover.start();
        }
    }

    fn stop(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            if let Some(autodiscover) = self {
                autodiscover.stop().await;
            }
        }
    }
}

/// State owned by the worker task.
struct Worker {
    adapter: Arc<dyn Adapter>,
    runners: Arc<Runners>,
    meta: Arc<MetaStore>,
}

impl Worker {
    async fn run(self, mut listener: Listener, shutdown_token: CancellationToken) {
        debug!("Autodiscover worker started");

        loop {
            tokio::select! {
                event = listener.recv() => match event {
                    Some(event) => self.handle_event(&event),
                    None => {
                        debug!("Autodiscover listener closed");
                        break;
                    }
                },
                () = shutdown_token.cancelled() => break,
            }
        }

        listener.stop();
        debug!("Autodiscover worker stopped");
    }

    fn handle_event(&self, event: &Event) {
        if event.is_start() {
            self.handle_start(event);
        }
        if event.is_stop() {
            self.handle_stop(event);
        }
    }

    fn handle_start(&self, event: &Event) {
        let configs = match self.adapter.create_config(event) {
            Ok(configs) => configs,
            Err(e) => {
                debug!("Could not generate config from event: {}", e);
                return;
            }
        };
        debug!("Got a start event, generated {} configs", configs.len());

        for config in configs {
            let hash = match config.hash() {
                Ok(hash) => hash,
                Err(e) => {
                    debug!("Could not hash config {:?}: {}", config, e);
                    continue;
                }
            };

            if let Err(e) = self.adapter.check_config(&config) {
                error!(%hash, "Auto discovered config is invalid: {}", e);
                continue;
            }

            // Refreshed even when the runner exists: labels may change
            // without changing the config.
            let meta = self.meta.store(hash, event.meta().cloned());

            if self.runners.has(hash) {
                debug!(%hash, "Config is already running");
                continue;
            }

            let runner: Arc<dyn Runner> = match self.adapter.create(&config, meta) {
                Ok(runner) => Arc::from(runner),
                Err(e) => {
                    error!(%hash, "Failed to create runner: {}", e);
                    continue;
                }
            };

            debug!(%hash, runner = %runner, "Starting runner");
            self.runners.add(hash, Arc::clone(&runner));
            runner.start();
        }
    }

    fn handle_stop(&self, event: &Event) {
        let configs = match self.adapter.create_config(event) {
            Ok(configs) => configs,
            Err(e) => {
                debug!("Could not generate config from event: {}", e);
                return;
            }
        };
        debug!("Got a stop event, generated {} configs", configs.len());

        for config in configs {
            let hash = match config.hash() {
                Ok(hash) => hash,
                Err(e) => {
                    debug!("Could not hash config {:?}: {}", config, e);
                    continue;
                }
            };

            self.meta.remove(hash);

            match self.runners.remove(hash) {
                Some(runner) => {
                    debug!(%hash, runner = %runner, "Stopping runner");
                    runner.stop();
                }
                None => debug!(%hash, "Runner not running for config"),
            }
        }
    }
}

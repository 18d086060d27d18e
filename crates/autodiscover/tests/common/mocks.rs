// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of the autodiscover collaborators

use autodiscover::pipeline::Pipeline;
use autodiscover::{Adapter, Bus, Config, Error, Event, MetaCell, Provider, Result, Runner};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct RunnerState {
    started: AtomicBool,
    stopped: AtomicBool,
    start_calls: AtomicUsize,
}

/// Runner recording its lifecycle calls
#[derive(Clone)]
pub struct MockRunner {
    state: Arc<RunnerState>,
    pub config: Config,
    pub meta: MetaCell,
}

#[allow(dead_code)]
impl MockRunner {
    pub fn started(&self) -> bool {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.state.start_calls.load(Ordering::SeqCst)
    }
}

impl fmt::Display for MockRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock runner")
    }
}

impl Runner for MockRunner {
    fn start(&self) {
        self.state.started.store(true, Ordering::SeqCst);
        self.state.start_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }
}

/// Adapter taking candidates from the event `config` key and keeping every
/// runner it creates
#[derive(Default)]
pub struct MockAdapter {
    runners: Mutex<Vec<MockRunner>>,
    events_seen: AtomicUsize,
}

#[allow(dead_code)]
impl MockAdapter {
    pub fn runners(&self) -> Vec<MockRunner> {
        self.runners.lock().unwrap().clone()
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen.load(Ordering::SeqCst)
    }
}

impl Adapter for MockAdapter {
    fn create_config(&self, event: &Event) -> Result<Vec<Config>> {
        self.events_seen.fetch_add(1, Ordering::SeqCst);
        event.configs().ok_or(Error::MissingConfigs)
    }

    fn check_config(&self, _config: &Config) -> Result<()> {
        Ok(())
    }

    fn create(&self, config: &Config, meta: MetaCell) -> Result<Box<dyn Runner>> {
        let runner = MockRunner {
            state: Arc::new(RunnerState::default()),
            config: config.clone(),
            meta,
        };
        self.runners.lock().unwrap().push(runner.clone());
        Ok(Box::new(runner))
    }

    fn event_filter(&self) -> Vec<String> {
        vec!["config".to_string()]
    }
}

#[derive(Debug, Default)]
pub struct ProviderState {
    pub started: AtomicBool,
    pub stopped: AtomicBool,
}

/// Provider that, once started, runs its pipeline over a fixed discovery
/// and publishes the result
pub struct MockProvider {
    pub bus: Bus,
    pub state: Arc<ProviderState>,
    pub discovery: Option<Event>,
    pub pipeline: Option<Arc<Pipeline>>,
}

impl fmt::Display for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock provider")
    }
}

impl Provider for MockProvider {
    fn start(&self) {
        self.state.started.store(true, Ordering::SeqCst);

        let Some(mut event) = self.discovery.clone() else {
            return;
        };
        if let Some(pipeline) = &self.pipeline {
            pipeline.configs(&mut event);
        }

        let bus = self.bus.clone();
        tokio::spawn(async move { bus.publish(event).await });
    }

    fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }
}

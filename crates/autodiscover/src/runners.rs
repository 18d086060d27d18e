// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Live runners indexed by configuration hash.
//!
//! Only the controller worker writes here. The lock exists so diagnostics can
//! snapshot the set from other tasks.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::adapter::Runner;
use crate::config::ConfigHash;

#[derive(Default)]
pub struct Runners {
    runners: RwLock<HashMap<ConfigHash, Arc<dyn Runner>>>,
}

impl std::fmt::Debug for Runners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runners").field("len", &self.len()).finish()
    }
}

impl Runners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a runner, returning the one previously held for `hash`.
    pub fn add(&self, hash: ConfigHash, runner: Arc<dyn Runner>) -> Option<Arc<dyn Runner>> {
        self.write().insert(hash, runner)
    }

    #[must_use]
    pub fn get(&self, hash: ConfigHash) -> Option<Arc<dyn Runner>> {
        self.read().get(&hash).cloned()
    }

    #[must_use]
    pub fn has(&self, hash: ConfigHash) -> bool {
        self.read().contains_key(&hash)
    }

    pub fn remove(&self, hash: ConfigHash) -> Option<Arc<dyn Runner>> {
        self.write().remove(&hash)
    }

    /// Snapshot of the live set, sorted by hash.
    #[must_use]
    pub fn copy_list(&self) -> Vec<(ConfigHash, Arc<dyn Runner>)> {
        let mut list: Vec<_> = self
            .read()
            .iter()
            .map(|(hash, runner)| (*hash, Arc::clone(runner)))
            .collect();
        list.sort_unstable_by_key(|(hash, _)| *hash);
        list
    }

    /// Stops and removes every runner. Returns the hashes that were live.
    pub fn stop_all(&self) -> Vec<ConfigHash> {
        let drained: Vec<_> = {
            let mut runners = self.write();
            runners.drain().collect()
        };

        let mut hashes = Vec::with_capacity(drained.len());
        for (hash, runner) in drained {
            debug!(hash = %hash, runner = %runner, "Stopping runner");
            runner.stop();
            hashes.push(hash);
        }
        hashes.sort_unstable();
        hashes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConfigHash, Arc<dyn Runner>>> {
        self.runners.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConfigHash, Arc<dyn Runner>>> {
        self.runners.write().unwrap_or_else(PoisonError::into_inner)
    }
}

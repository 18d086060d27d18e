// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Runner metadata shared between the controller and live runners.
//!
//! The store hands out a [`MetaCell`] per configuration hash. The runner
//! created for that hash keeps a clone of the same cell, so a later `start`
//! event with refreshed metadata (new labels, say) reaches the running worker
//! without a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::config::ConfigHash;

/// Shared, in-place updatable metadata map.
#[derive(Clone, Debug, Default)]
pub struct MetaCell(Arc<RwLock<Map<String, Value>>>);

impl MetaCell {
    #[must_use]
    pub fn new(meta: Map<String, Value>) -> Self {
        MetaCell(Arc::new(RwLock::new(meta)))
    }

    /// Snapshot of the current metadata.
    #[must_use]
    pub fn get(&self) -> Map<String, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replaces the contents; every holder of the cell sees the new value.
    pub fn set(&self, meta: Map<String, Value>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = meta;
    }

    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// True if both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &MetaCell) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Map from configuration hash to its metadata cell.
#[derive(Debug, Default)]
pub struct MetaStore {
    cells: Mutex<HashMap<ConfigHash, MetaCell>>,
}

impl MetaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the cell for `hash` or updates the existing one in place.
    ///
    /// Absent metadata is stored as an empty map.
    pub fn store(&self, hash: ConfigHash, meta: Option<Map<String, Value>>) -> MetaCell {
        let meta = meta.unwrap_or_default();
        let mut cells = self.cells();
        match cells.get(&hash) {
            Some(cell) => {
                cell.set(meta);
                cell.clone()
            }
            None => {
                let cell = MetaCell::new(meta);
                cells.insert(hash, cell.clone());
                cell
            }
        }
    }

    #[must_use]
    pub fn get(&self, hash: ConfigHash) -> Option<MetaCell> {
        self.cells().get(&hash).cloned()
    }

    pub fn remove(&self, hash: ConfigHash) -> Option<MetaCell> {
        self.cells().remove(&hash)
    }

    pub fn clear(&self) {
        self.cells().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells().is_empty()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<ConfigHash, MetaCell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

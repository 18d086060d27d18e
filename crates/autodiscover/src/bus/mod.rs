// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-process event bus with per-listener key filters.
//!
//! # Architecture
//!
//! ```text
//! Providers (many)          Bus                    Listeners (many)
//!     │                      │                           │
//!     ├─ {start, config} ───>│── filter {config} ──> MPSC(100) ──> rx
//!     ├─ {stop, config} ────>│── filter {host}   ──> MPSC(100) ──> rx
//!     └─ {start, host} ─────>│── filter {}       ──> MPSC(100) ──> rx
//! ```
//!
//! - **Filtering**: a listener receives an event only if every key of its
//!   filter is present in the event, regardless of the value.
//! - **Backpressure**: each listener owns a bounded queue of
//!   [`QUEUE_CAPACITY`] events. `publish` waits for space, so a slow listener
//!   stalls the publisher (and therefore delivery to listeners after it).
//! - **Ordering**: a single publish lock serialises deliveries, so every
//!   listener observes events in `publish` call order.

mod listener;

pub use listener::Listener;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::constants::QUEUE_CAPACITY;
use crate::event::Event;

struct Subscription {
    id: u64,
    filter: Vec<String>,
    tx: mpsc::Sender<Event>,
}

struct Inner {
    name: String,
    subscriptions: Mutex<Vec<Subscription>>,
    publish_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
}

/// Cheap-to-clone handle on a named bus.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Bus {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Bus {
            inner: Arc::new(Inner {
                name: name.into(),
                subscriptions: Mutex::new(Vec::new()),
                publish_lock: tokio::sync::Mutex::new(()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Publishes an event to every listener whose filter it satisfies.
    ///
    /// Waits while a matching listener's queue is full. Listeners stopped
    /// before or during delivery are skipped.
    pub async fn publish(&self, event: Event) {
        let _guard = self.inner.publish_lock.lock().await;

        let targets: Vec<(u64, mpsc::Sender<Event>)> = self
            .subscriptions()
            .iter()
            .filter(|sub| event.contains_all(&sub.filter))
            .map(|sub| (sub.id, sub.tx.clone()))
            .collect();

        debug!(
            bus = %self.inner.name,
            listeners = targets.len(),
            "Publishing event"
        );

        for (id, tx) in targets {
            if tx.send(event.clone()).await.is_err() {
                trace!(
                    bus = %self.inner.name,
                    listener = id,
                    "Listener stopped before delivery"
                );
            }
        }
    }

    /// Registers a listener interested in events carrying all `filter` keys.
    ///
    /// An empty filter matches every event.
    #[must_use]
    pub fn subscribe<S: Into<String>>(&self, filter: impl IntoIterator<Item = S>) -> Listener {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let filter: Vec<String> = filter.into_iter().map(Into::into).collect();

        debug!(bus = %self.inner.name, listener = id, ?filter, "Listener subscribed");
        self.subscriptions().push(Subscription { id, filter, tx });

        Listener::new(id, rx, self.clone())
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.subscriptions().len()
    }

    pub(crate) fn unsubscribe(&self, id: u64) {
        let mut subscriptions = self.subscriptions();
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        if subscriptions.len() != before {
            debug!(bus = %self.inner.name, listener = id, "Listener unsubscribed");
        }
    }

    fn subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

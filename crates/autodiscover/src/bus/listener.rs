// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::mpsc;

use super::Bus;
use crate::event::Event;

/// Subscription handle returned by [`Bus::subscribe`].
///
/// Dropping the listener stops it.
pub struct Listener {
    id: u64,
    rx: mpsc::Receiver<Event>,
    bus: Bus,
    stopped: bool,
}

impl Listener {
    pub(super) fn new(id: u64, rx: mpsc::Receiver<Event>, bus: Bus) -> Self {
        Listener {
            id,
            rx,
            bus,
            stopped: false,
        }
    }

    /// Next event, or `None` once the listener is stopped and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Listener::recv`].
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Removes the listener from the bus and closes its queue.
    ///
    /// A publish blocked on this queue fails fast instead of hanging.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.rx.close();
        self.bus.unsubscribe(self.id);
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

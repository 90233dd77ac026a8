use std::fmt;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::RwLock;

use crate::{Seed, SeedListener};

/// Unbounded FIFO of discovered seeds with synchronous listener fan-out.
///
/// Any number of producers and consumers may share one instance behind an `Arc`.
/// Listeners run on the thread that called [`SeedStorage::add_seed`], after the seed is
/// queued and before the call returns. A listener that blocks stalls that producer,
/// and a listener that panics unwinds through it.
pub struct SeedStorage {
    tx: Sender<Seed>,
    rx: Receiver<Seed>,
    listeners: RwLock<Vec<Arc<dyn SeedListener>>>,
}

impl SeedStorage {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register for notification of seeds added from now on.
    pub fn add_listener(&self, listener: Arc<dyn SeedListener>) -> bool {
        self.listeners.write().push(listener);
        true
    }

    /// Drop every registration of `listener`. Returns whether anything was removed.
    ///
    /// A fan-out already running keeps its snapshot and may still call the listener.
    pub fn remove_listener(&self, listener: &Arc<dyn SeedListener>) -> bool {
        let mut guard = self.listeners.write();
        let before = guard.len();
        guard.retain(|registered| !Arc::ptr_eq(registered, listener));
        before != guard.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Queue `seed`, then hand it to each listener in registration order.
    ///
    /// Listeners are only notified when the append succeeds. The seed stays queued
    /// regardless of listeners; consumers still remove it with [`SeedStorage::get_seed`].
    pub fn add_seed(&self, seed: Seed) -> bool {
        if self.tx.send(seed.clone()).is_err() {
            tracing::warn!(target: "seedbank::storage", filter = %seed.filter(), "seed queue closed");
            return false;
        }
        tracing::trace!(
            target: "seedbank::storage",
            filter = %seed.filter(),
            start = seed.start(),
            searched = seed.is_searched(),
            "seed queued"
        );

        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.new_seed(&seed);
        }
        true
    }

    /// Advisory: another consumer may take the seed before you do.
    pub fn has_seed(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Remove and return the oldest queued seed, if any. Listeners are not involved.
    pub fn get_seed(&self) -> Option<Seed> {
        match self.rx.try_recv() {
            Ok(seed) => Some(seed),
            Err(TryRecvError::Empty) => None,
            // We own both ends, so the channel cannot disconnect while `self` lives.
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for SeedStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SeedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedStorage")
            .field("queued", &self.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

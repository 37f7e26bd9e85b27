//! Reusable reply channels for the actor store
//!
//! Each Fetch or Enumerate needs somewhere for the worker to put its answer.
//! Instead of allocating a fresh one-shot channel per call, the pooled store
//! keeps free lists of capacity-one channels. A channel goes back on its list
//! only after its single response has been read; a caller that gives up
//! waiting drops the channel so a late response can never reach the next user.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::trace;

use super::message::ReplyTo;

struct ReplySlot<R> {
    tx: mpsc::Sender<R>,
    rx: mpsc::Receiver<R>,
}

impl<R> ReplySlot<R> {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }
}

/// Free list of reply channels carrying responses of type `R`
pub struct ReplyPool<R> {
    idle: Mutex<Vec<ReplySlot<R>>>,
    max_idle: usize,
    created: AtomicUsize,
}

impl<R> ReplyPool<R> {
    /// Create an empty pool that retains at most `max_idle` channels
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            created: AtomicUsize::new(0),
        }
    }

    /// Channels currently waiting to be reused
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Channels allocated over the pool's lifetime
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Take an idle channel, allocating one if the pool is empty
    pub(crate) fn acquire(&self) -> PooledReply<'_, R> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let slot = reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            ReplySlot::new()
        });
        PooledReply { pool: self, slot }
    }

    fn put_back(&self, slot: ReplySlot<R>) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(slot);
        } else {
            trace!("Reply pool full, dropping channel");
        }
    }
}

/// Reply pools of the pooled actor store, one per answer type
pub struct ReplyPools<K, V> {
    /// Channels answering Fetch requests
    pub fetch: ReplyPool<Option<V>>,
    /// Channels answering Enumerate requests
    pub enumerate: ReplyPool<Vec<K>>,
}

impl<K, V> ReplyPools<K, V> {
    pub fn new(max_idle: usize) -> Self {
        Self {
            fetch: ReplyPool::new(max_idle),
            enumerate: ReplyPool::new(max_idle),
        }
    }
}

/// A reply channel checked out of a [`ReplyPool`]
///
/// Dropping it without calling [`release`](Self::release) discards the
/// channel.
pub(crate) struct PooledReply<'a, R> {
    pool: &'a ReplyPool<R>,
    slot: ReplySlot<R>,
}

impl<R> PooledReply<'_, R> {
    /// Sender half to embed in a request
    pub(crate) fn reply_to(&self) -> ReplyTo<R> {
        ReplyTo::Pooled(self.slot.tx.clone())
    }

    /// Wait for the worker's response
    ///
    /// The slot keeps its own sender alive, so a stopped worker is detected
    /// through the request queue closing instead. Returns `None` in that case.
    pub(crate) async fn recv<Q>(&mut self, requests: &mpsc::Sender<Q>) -> Option<R> {
        tokio::select! {
            biased;
            response = self.slot.rx.recv() => response,
            _ = requests.closed() => None,
        }
    }

    /// Return the channel to its pool once its response has been consumed
    pub(crate) fn release(self) {
        self.pool.put_back(self.slot);
    }
}

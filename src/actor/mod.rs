//! Single-owner key-value store
//!
//! One worker task owns the map. Handles turn every call into a [`Request`]
//! and push it onto a bounded queue; the worker serves requests strictly in
//! arrival order, which makes every operation linearizable without a lock.
//!
//! `set` and `delete` return as soon as the queue accepts the request. `get`
//! and `list_keys` wait for the worker to answer on a reply channel, either a
//! fresh one-shot channel or one checked out of a [`ReplyPool`].
//! Fetch and Enumerate get reply channels typed for their own answer.

mod message;
pub mod pool;

pub use pool::{ReplyPool, ReplyPools};

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{StoreConfig, Strategy};
use crate::error::{Result, StoreError};
use crate::store::KvStore;
use message::{ReplyTo, Request};

/// Key-value store served by a dedicated worker task
pub struct ActorStore<K, V> {
    requests: mpsc::Sender<Request<K, V>>,
    pools: Option<ReplyPools<K, V>>,
    reply_timeout: Option<Duration>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<K, V> ActorStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a store with a one-slot queue and fresh reply channels per call
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(&StoreConfig {
            strategy: Strategy::Actor,
            ..StoreConfig::default()
        })
    }

    /// Create a store that reuses reply channels from a pool
    pub fn pooled() -> Self {
        Self::with_config(&StoreConfig {
            strategy: Strategy::Pooled,
            ..StoreConfig::default()
        })
    }

    /// Create a store from configuration and spawn its worker
    ///
    /// Reply channels are pooled only for [`Strategy::Pooled`]. A queue
    /// capacity outside what the channel supports is clamped into range.
    pub fn with_config(config: &StoreConfig) -> Self {
        let queue_capacity = config.queue_capacity.clamp(1, Semaphore::MAX_PERMITS);
        let (requests, queue) = mpsc::channel(queue_capacity);
        let worker = tokio::spawn(Worker::new(queue).run());

        let pools = match config.strategy {
            Strategy::Pooled => Some(ReplyPools::new(config.reply_pool_size)),
            Strategy::Actor | Strategy::Locked => None,
        };
        info!(
            queue_capacity,
            pooled = pools.is_some(),
            "Actor store started"
        );

        Self {
            requests,
            pools,
            reply_timeout: config.reply_timeout(),
            worker: Mutex::new(Some(worker)),
        }
    }
}

impl<K, V> ActorStore<K, V> {
    /// Whether the worker has stopped accepting requests
    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }

    /// Reply pools, present only for the pooled strategy
    pub fn reply_pools(&self) -> Option<&ReplyPools<K, V>> {
        self.pools.as_ref()
    }

    /// Stop the worker after it serves every request queued before this call
    ///
    /// Waits for the worker to exit, also when several callers shut down at
    /// once. Later calls on this store fail with [`StoreError::Closed`].
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let (done, stopped) = oneshot::channel();
        if self.requests.send(Request::Stop { done }).await.is_ok() {
            // Err only when another shutdown got there first.
            let _ = stopped.await;
        }

        // Held across the join so a concurrent caller returns only after
        // the worker has exited.
        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!("Actor store worker failed: {}", e);
            }
        }
    }

    async fn send(&self, request: Request<K, V>) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| StoreError::Closed)
    }

    /// Send a request carrying a reply channel and wait for its response
    ///
    /// Uses `pool` for the reply channel when given, a fresh one-shot
    /// channel otherwise.
    async fn call<R, F>(&self, pool: Option<&ReplyPool<R>>, make_request: F) -> Result<R>
    where
        F: FnOnce(ReplyTo<R>) -> Request<K, V>,
    {
        match pool {
            Some(pool) => {
                let mut reply = pool.acquire();
                self.send(make_request(reply.reply_to())).await?;
                let response = self.wait(reply.recv(&self.requests)).await?;
                reply.release();
                Ok(response)
            }
            None => {
                let (tx, rx) = oneshot::channel();
                self.send(make_request(ReplyTo::Oneshot(tx))).await?;
                self.wait(async { rx.await.ok() }).await
            }
        }
    }

    async fn wait<R, F>(&self, reply: F) -> Result<R>
    where
        F: Future<Output = Option<R>>,
    {
        let response = match self.reply_timeout {
            Some(limit) => tokio::time::timeout(limit, reply)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => reply.await,
        };
        response.ok_or(StoreError::Closed)
    }
}

impl<K, V> Default for ActorStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> KvStore<K, V> for ActorStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<V> {
        let key = key.clone();
        let pool = self.pools.as_ref().map(|pools| &pools.fetch);
        self.call(pool, |reply| Request::Fetch { key, reply })
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn set(&self, key: K, value: V) -> Result<()> {
        self.send(Request::Put { key, value }).await
    }

    async fn delete(&self, key: &K) -> Result<()> {
        self.send(Request::Remove { key: key.clone() }).await
    }

    async fn list_keys(&self) -> Result<Vec<K>> {
        let pool = self.pools.as_ref().map(|pools| &pools.enumerate);
        self.call(pool, |reply| Request::Enumerate { reply }).await
    }
}

/// Owner of the map; the only code that ever touches it
struct Worker<K, V> {
    data: HashMap<K, V>,
    queue: mpsc::Receiver<Request<K, V>>,
}

impl<K, V> Worker<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn new(queue: mpsc::Receiver<Request<K, V>>) -> Self {
        Self {
            data: HashMap::new(),
            queue,
        }
    }

    /// Serve requests until stopped or every handle is dropped
    async fn run(mut self) {
        debug!("Actor store worker running");

        while let Some(request) = self.queue.recv().await {
            debug!(kind = request.kind(), "Processing request");
            match request {
                Request::Put { key, value } => {
                    self.data.insert(key, value);
                }
                Request::Remove { key } => {
                    self.data.remove(&key);
                }
                Request::Fetch { key, reply } => {
                    Self::reply(reply, self.data.get(&key).cloned());
                }
                Request::Enumerate { reply } => {
                    Self::reply(reply, self.data.keys().cloned().collect());
                }
                Request::Stop { done } => {
                    // Reject new requests; anything still queued is dropped,
                    // which fails its caller with Closed.
                    self.queue.close();
                    let _ = done.send(());
                    break;
                }
            }
        }

        info!(entries = self.data.len(), "Actor store worker stopped");
    }

    fn reply<R>(reply: ReplyTo<R>, response: R) {
        if !reply.send(response) {
            warn!("Caller stopped waiting, dropping reply");
        }
    }
}

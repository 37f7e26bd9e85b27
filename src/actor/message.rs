//! Messages exchanged between store handles and the worker task

use tokio::sync::{mpsc, oneshot};

/// A single operation queued for the worker
///
/// Fetch and Enumerate each carry a reply channel typed for their own
/// answer: the looked-up value (`None` when the key is absent) or the list
/// of live keys.
#[derive(Debug)]
pub(crate) enum Request<K, V> {
    /// Insert or overwrite
    Put { key: K, value: V },
    /// Look up one key
    Fetch { key: K, reply: ReplyTo<Option<V>> },
    /// Delete one key if present
    Remove { key: K },
    /// Collect all live keys
    Enumerate { reply: ReplyTo<Vec<K>> },
    /// Stop after every earlier request has been served
    Stop { done: oneshot::Sender<()> },
}

impl<K, V> Request<K, V> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Request::Put { .. } => "put",
            Request::Fetch { .. } => "fetch",
            Request::Remove { .. } => "remove",
            Request::Enumerate { .. } => "enumerate",
            Request::Stop { .. } => "stop",
        }
    }
}

/// Where the worker delivers a response
///
/// A one-shot channel is created per call. A pooled channel is a bounded
/// channel of capacity one that the caller hands back to its pool after
/// reading the single response.
#[derive(Debug)]
pub(crate) enum ReplyTo<R> {
    Oneshot(oneshot::Sender<R>),
    Pooled(mpsc::Sender<R>),
}

impl<R> ReplyTo<R> {
    /// Deliver `response`, returning false when the caller is no longer waiting
    pub(crate) fn send(self, response: R) -> bool {
        match self {
            ReplyTo::Oneshot(tx) => tx.send(response).is_ok(),
            // The slot is empty: its previous response was consumed before
            // the channel went back to the pool.
            ReplyTo::Pooled(tx) => tx.try_send(response).is_ok(),
        }
    }
}

//! Concurrent in-memory key-value store
//!
//! Two interchangeable strategies implement the same [`KvStore`] contract:
//!
//! - [`LockedStore`]: a `HashMap` behind a reader/writer lock, served on the
//!   caller's task.
//! - [`ActorStore`]: a `HashMap` owned by a single worker task that serves
//!   requests from a queue in arrival order, optionally reusing reply
//!   channels from a [`ReplyPool`].

pub mod actor;
pub mod config;
pub mod error;
pub mod store;

pub use actor::{ActorStore, ReplyPool, ReplyPools};
pub use config::{Config, LogConfig, StoreConfig, Strategy};
pub use error::{Result, StoreError};
pub use store::{KvStore, LockedStore, open};

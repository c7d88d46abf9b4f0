// SPDX-License-Identifier: LGPL-2.1-or-later
//
// This file is part of redis-keyvalue.
//
// redis-keyvalue is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// redis-keyvalue is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with redis-keyvalue. If not, see <https://www.gnu.org/licenses/>.

//! # Redis key-value adapter
//!
//! ## Purpose
//! Presents a remote Redis instance through a uniform key-value contract
//! consumable by a generic caching front end: namespaced key names with a
//! configurable separator, millisecond TTL propagation, atomic multi-key
//! operations, and cursor-driven full-keyspace scanning for clearing and
//! iterating a namespace without blocking the server.
//!
//! ## Key Components
//!
//! - [`KeyValueStore`]: the contract a caching front end consumes
//! - [`RedisStore`]: its Redis-backed implementation
//! - [`ScanIter`]: lazy pull-based iterator over a namespace
//! - [`ClearReport`]: outcome of a best-effort `clear`
//! - [`RedisConfig`]: explicit or environment-based configuration
//! - [`StoreError`]: error type for all operations
//!
//! ## Namespacing
//! A namespace is realized purely as a key-name prefix
//! (`namespace + separator + key`, separator `"::"` by default). A key
//! stored under namespace `N` is indistinguishable at the protocol level
//! from a literal key carrying the same prefix, and separator occurrences
//! inside raw keys are not escaped; both are accepted limitations.
//!
//! ## Error Tiers
//! Single-key and batch operations propagate every remote-store failure to
//! the caller. `clear` alone is fail-open: scan-loop failures are recorded
//! in its [`ClearReport`] (and logged at `warn`) while the call itself
//! resolves normally, so one bad page cannot leave the adapter looking
//! broken.
//!
//! ## Examples
//! ```rust,no_run
//! use redis_keyvalue::{Entry, KeyValueStore, RedisStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RedisStore::new("redis://localhost:6379").await?;
//! store.set_namespace(Some("sessions"));
//!
//! store.set("alice", b"token-1".to_vec(), None).await?;
//! assert_eq!(store.get("alice").await?, Some(b"token-1".to_vec()));
//!
//! store
//!     .set_many(&[
//!         Entry::new("bob", b"token-2".to_vec()),
//!         Entry::new("carol", b"token-3".to_vec()),
//!     ])
//!     .await?;
//!
//! let mut iter = store.iter(Some("sessions"));
//! while let Some((key, value)) = iter.next().await? {
//!     println!("{key} => {} bytes", value.len());
//! }
//!
//! let report = store.clear().await;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

pub mod config;
pub mod error;
mod keyspace;
pub mod scan;
pub mod store;

pub use config::RedisConfig;
pub use error::{StoreError, StoreResult};
pub use keyspace::DEFAULT_SEPARATOR;
pub use scan::ScanIter;
pub use store::{ClearReport, RedisStore};

/// Input shape for [`KeyValueStore::set_many`].
///
/// Not a persisted structure; values are raw bytes passed through to the
/// store unchanged.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Raw (un-namespaced) key
    pub key: String,
    /// Value bytes
    pub value: Vec<u8>,
    /// Per-entry TTL; falls back to the adapter's default TTL when `None`
    pub ttl: Option<Duration>,
}

impl Entry {
    /// Entry without a per-entry TTL.
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }

    /// Entry with its own TTL.
    pub fn with_ttl(key: impl Into<String>, value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: Some(ttl),
        }
    }
}

/// Uniform key-value contract over a remote store.
///
/// ## Design Decisions
/// - **Raw values**: values are `Vec<u8>` handed to the store unchanged;
///   serialization belongs to the caching front end
/// - **Absent vs nil**: `get` returns `None` both for a missing key and
///   for the store's nil sentinel; the two are not distinguished
/// - **Order preservation**: every batch read returns a sequence with the
///   same length and order as its input
/// - **Best-effort clear**: `clear` never fails the call; see
///   [`ClearReport`]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value, with `ttl` (falling back to the adapter's default
    /// TTL) as a relative millisecond expiry. Without any TTL the value is
    /// stored plain, overwriting any previous expiry on that key.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()>;

    /// Fetch a value. `None` for an absent key or a nil value.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// True iff the store reports the key as existing.
    async fn has(&self, key: &str) -> StoreResult<bool>;

    /// Remove a key. True iff a key was actually removed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Store all entries as one atomic transaction; either every entry is
    /// applied or the whole call fails. No per-entry result.
    async fn set_many(&self, entries: &[Entry]) -> StoreResult<()>;

    /// Fetch values for all keys with a single multi-get. The result has
    /// the same length and order as `keys`, with `None` at the index of
    /// every absent key.
    async fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<Vec<u8>>>>;

    /// Existence check per key, batched into one transaction; `keys[i]`
    /// maps to `result[i]`.
    async fn has_many(&self, keys: &[&str]) -> StoreResult<Vec<bool>>;

    /// Remove all keys with one bulk command. True iff at least one key
    /// was removed across the whole batch; there is no per-key result.
    async fn delete_many(&self, keys: &[&str]) -> StoreResult<bool>;

    /// Remove every key visible under the current partitioning policy.
    /// Best-effort: failures are recorded in the report, never raised.
    async fn clear(&self) -> ClearReport;

    /// Lazily iterate `(raw_key, value)` pairs, scoped to `namespace` when
    /// given. Consumers that stop polling early avoid fetching later
    /// pages.
    fn iter(&self, namespace: Option<&str>) -> BoxStream<'static, StoreResult<(String, Vec<u8>)>>;
}

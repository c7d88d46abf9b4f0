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

//! Redis store adapter.
//!
//! ## Purpose
//! Presents a Redis instance through the uniform [`KeyValueStore`] contract:
//! namespaced key names, millisecond TTL propagation, atomic multi-key
//! transactions, and cursor-driven clearing/iteration of a namespace.
//!
//! ## Architecture
//! - `redis` crate with async [`ConnectionManager`] (pooling, automatic
//!   reconnection); the manager is cloned per operation
//! - Namespacing is purely a key-name prefix, built by [`Keyspace`]
//! - TTL uses native PSETEX/PX expiry, never tracked adapter-side
//! - Batch operations go through one MULTI/EXEC transaction
//!
//! ## Concurrency
//! Every operation is an independent round trip (or fixed short sequence
//! of round trips); there is no background task, no internal locking, and
//! no retry. Two concurrent writers to the same key are ordered only by
//! the server. An application write landing between a `clear` scan page
//! being read and its deletion being issued can be lost to that deletion;
//! this race is inherent to scan-then-delete clearing and is accepted.
//! Option setters take `&mut self`, so options cannot change while a call
//! on the same instance is in flight.

use crate::config::RedisConfig;
use crate::error::{StoreError, StoreResult};
use crate::keyspace::Keyspace;
use crate::scan::{mget_values, scan_page, ScanIter};
use crate::{Entry, KeyValueStore};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::warn;

/// Outcome of a [`KeyValueStore::clear`] call.
///
/// `clear` is a best-effort bulk maintenance operation spanning many round
/// trips, so mid-loop failures do not fail the call: they are recorded here
/// (and logged) while the loop carries on where it can. The caller decides
/// whether a partial clear matters.
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Number of keys the server reported removed
    pub deleted: usize,
    /// Failures swallowed during the scan-and-delete loop, in order
    pub failures: Vec<StoreError>,
}

impl ClearReport {
    /// True when the clear ran to completion without a recorded failure.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Redis-backed implementation of [`KeyValueStore`].
///
/// ## Construction
/// Either owned (the adapter opens the client itself) or from a
/// caller-supplied [`ConnectionManager`], in which case the caller retains
/// responsibility for the connection's lifetime:
///
/// ```rust,no_run
/// use redis_keyvalue::{KeyValueStore, RedisStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = RedisStore::new("redis://localhost:6379").await?;
/// store.set_namespace(Some("myapp"));
/// store.set("greeting", b"hello".to_vec(), None).await?;
/// # Ok(())
/// # }
/// ```
///
/// ## Runtime options
/// `namespace`, `key_prefix_separator`, `default_ttl`, `use_unlink`,
/// `clear_batch_size`, and `no_namespace_affects_all` are plain fields with
/// getters and `&mut self` setters. They are read fresh at the start of
/// every operation; no derived state is cached.
pub struct RedisStore {
    manager: ConnectionManager,
    namespace: Option<String>,
    key_prefix_separator: String,
    default_ttl: Option<Duration>,
    use_unlink: bool,
    clear_batch_size: usize,
    no_namespace_affects_all: bool,
}

impl RedisStore {
    /// Connect to Redis at `url` with default options.
    ///
    /// ## Errors
    /// [`StoreError::Backend`] if the URL is invalid or the connection
    /// cannot be established.
    pub async fn new(url: &str) -> StoreResult<Self> {
        Self::from_config(RedisConfig::new(url)).await
    }

    /// Connect using an explicit [`RedisConfig`].
    pub async fn from_config(config: RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self::with_manager_and_options(manager, config))
    }

    /// Connect using configuration from `REDIS_KV_*` environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Self::from_config(RedisConfig::from_env()?).await
    }

    /// Wrap a caller-supplied connection manager with default options.
    ///
    /// The caller keeps ownership of the underlying connection's lifecycle;
    /// dropping the adapter does not tear down other clones of the manager.
    pub fn with_manager(manager: ConnectionManager) -> Self {
        Self::with_manager_and_options(manager, RedisConfig::default())
    }

    fn with_manager_and_options(manager: ConnectionManager, config: RedisConfig) -> Self {
        Self {
            manager,
            namespace: config.namespace,
            key_prefix_separator: config.key_prefix_separator,
            default_ttl: config.default_ttl,
            use_unlink: config.use_unlink,
            clear_batch_size: config.clear_batch_size,
            no_namespace_affects_all: config.no_namespace_affects_all,
        }
    }

    /// Current namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Set or unset the namespace applied to subsequent operations.
    pub fn set_namespace(&mut self, namespace: Option<impl Into<String>>) {
        self.namespace = namespace.map(Into::into);
    }

    /// Separator joining namespace and raw key.
    pub fn key_prefix_separator(&self) -> &str {
        &self.key_prefix_separator
    }

    /// Change the namespace/key separator.
    pub fn set_key_prefix_separator(&mut self, separator: impl Into<String>) {
        self.key_prefix_separator = separator.into();
    }

    /// TTL applied when a per-call TTL is omitted.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Set or unset the default TTL.
    pub fn set_default_ttl(&mut self, ttl: Option<Duration>) {
        self.default_ttl = ttl;
    }

    /// Whether bulk removal uses UNLINK (non-blocking) instead of DEL.
    pub fn use_unlink(&self) -> bool {
        self.use_unlink
    }

    /// Select UNLINK or DEL for removals. Both are equivalent for this
    /// contract (existence plus removal); they differ only in the server's
    /// execution cost model.
    pub fn set_use_unlink(&mut self, use_unlink: bool) {
        self.use_unlink = use_unlink;
    }

    /// Maximum keys enumerated per scan page during `clear`.
    pub fn clear_batch_size(&self) -> usize {
        self.clear_batch_size
    }

    /// Change the `clear` scan page size.
    pub fn set_clear_batch_size(&mut self, size: usize) {
        self.clear_batch_size = size;
    }

    /// Whether clear/iterate with no namespace cover the whole keyspace.
    pub fn no_namespace_affects_all(&self) -> bool {
        self.no_namespace_affects_all
    }

    /// When true and no namespace is set, `clear` flushes the entire
    /// database and iteration stops filtering out namespaced keys.
    pub fn set_no_namespace_affects_all(&mut self, affects_all: bool) {
        self.no_namespace_affects_all = affects_all;
    }

    /// Lazily iterate the `(raw_key, value)` pairs of a namespace.
    ///
    /// With `Some(namespace)` the scan matches that namespace's keys and
    /// yields them with the prefix stripped. With `None` it matches the
    /// whole keyspace; unless `no_namespace_affects_all` is set, keys
    /// containing the separator are filtered out so only genuinely
    /// unprefixed keys are yielded (mirroring `clear`).
    ///
    /// Each call starts a fresh scan; see [`ScanIter`] for the paging and
    /// early-termination behavior.
    pub fn iter(&self, namespace: Option<&str>) -> ScanIter {
        let keyspace = Keyspace::new(namespace, &self.key_prefix_separator);
        let filter_unprefixed = namespace.is_none() && !self.no_namespace_affects_all;
        ScanIter::new(self.manager.clone(), keyspace, filter_unprefixed)
    }

    /// Key codec for the adapter's current namespace and separator.
    fn keyspace(&self) -> Keyspace {
        Keyspace::new(self.namespace.as_deref(), &self.key_prefix_separator)
    }

    /// Remove a batch of fully-qualified keys with one UNLINK/DEL, returning
    /// the removed count.
    async fn bulk_delete(&self, conn: &mut ConnectionManager, keys: &[String]) -> StoreResult<usize> {
        let removed: usize = if self.use_unlink {
            conn.unlink(keys).await?
        } else {
            conn.del(keys).await?
        };
        Ok(removed)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> StoreResult<()> {
        let full = self.keyspace().encode(key);
        let mut conn = self.manager.clone();

        match ttl.or(self.default_ttl) {
            Some(ttl) => {
                conn.pset_ex::<_, _, ()>(&full, value, ttl.as_millis() as u64)
                    .await?
            }
            // Plain SET also drops any previous expiry on the key.
            None => conn.set::<_, _, ()>(&full, value).await?,
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let full = self.keyspace().encode(key);
        let mut conn = self.manager.clone();

        let value: Option<Vec<u8>> = conn.get(&full).await?;
        Ok(value)
    }

    async fn has(&self, key: &str) -> StoreResult<bool> {
        let full = self.keyspace().encode(key);
        let mut conn = self.manager.clone();

        let exists: bool = conn.exists(&full).await?;
        Ok(exists)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let full = self.keyspace().encode(key);
        let mut conn = self.manager.clone();

        let removed = self.bulk_delete(&mut conn, std::slice::from_ref(&full)).await?;
        Ok(removed > 0)
    }

    async fn set_many(&self, entries: &[Entry]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let keyspace = self.keyspace();
        let mut conn = self.manager.clone();

        let mut pipe = redis::pipe();
        pipe.atomic();
        for entry in entries {
            let full = keyspace.encode(&entry.key);
            match entry.ttl.or(self.default_ttl) {
                Some(ttl) => {
                    pipe.pset_ex(full, entry.value.clone(), ttl.as_millis() as u64);
                }
                None => {
                    pipe.set(full, entry.value.clone());
                }
            }
        }
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keyspace = self.keyspace();
        let mut conn = self.manager.clone();

        let full: Vec<String> = keys.iter().map(|k| keyspace.encode(k)).collect();
        mget_values(&mut conn, &full).await
    }

    async fn has_many(&self, keys: &[&str]) -> StoreResult<Vec<bool>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keyspace = self.keyspace();
        let mut conn = self.manager.clone();

        let mut pipe = redis::pipe();
        pipe.atomic();
        for key in keys {
            pipe.exists(keyspace.encode(key));
        }
        let results: Vec<bool> = pipe.query_async(&mut conn).await?;
        Ok(results)
    }

    async fn delete_many(&self, keys: &[&str]) -> StoreResult<bool> {
        if keys.is_empty() {
            return Ok(false);
        }
        let keyspace = self.keyspace();
        let mut conn = self.manager.clone();

        let full: Vec<String> = keys.iter().map(|k| keyspace.encode(k)).collect();
        let removed = self.bulk_delete(&mut conn, &full).await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> ClearReport {
        let mut report = ClearReport::default();
        let keyspace = self.keyspace();
        let mut conn = self.manager.clone();

        // Whole-database wipe: one round trip, removes every key regardless
        // of prefix.
        if !keyspace.has_namespace() && self.no_namespace_affects_all {
            if let Err(e) = redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await {
                warn!(error = %e, "flushdb failed during clear");
                report.failures.push(e.into());
            }
            return report;
        }

        let pattern = keyspace.pattern();
        let filter_unprefixed = !keyspace.has_namespace();
        let mut cursor = 0u64;

        loop {
            let (next, mut keys) = match scan_page(
                &mut conn,
                cursor,
                &pattern,
                Some(self.clear_batch_size),
            )
            .await
            {
                Ok(page) => page,
                Err(e) => {
                    // The cursor is unusable after a failed SCAN.
                    warn!(error = %e, cursor, "keyspace scan failed during clear");
                    report.failures.push(e);
                    break;
                }
            };
            cursor = next;

            if filter_unprefixed {
                keys.retain(|k| keyspace.is_unprefixed(k));
            }
            if !keys.is_empty() {
                match self.bulk_delete(&mut conn, &keys).await {
                    Ok(removed) => report.deleted += removed,
                    Err(e) => {
                        warn!(error = %e, page_len = keys.len(), "page delete failed during clear");
                        report.failures.push(e);
                    }
                }
            }

            if cursor == 0 {
                break;
            }
        }

        report
    }

    fn iter(&self, namespace: Option<&str>) -> BoxStream<'static, StoreResult<(String, Vec<u8>)>> {
        RedisStore::iter(self, namespace).into_stream().boxed()
    }
}

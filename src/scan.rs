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

//! Cursor-driven keyspace enumeration.
//!
//! ## Purpose
//! Paginates the Redis keyspace with SCAN so that `clear` and the lazy
//! iterator never block the server or load the whole key set into memory.
//! Cursor `0` both starts a scan and, when returned, signals that a full
//! cycle has completed.

use crate::error::StoreResult;
use crate::keyspace::Keyspace;
use futures::stream::Stream;
use redis::aio::ConnectionManager;
use std::collections::VecDeque;
use tracing::debug;

/// Fetch one SCAN page, restricted to string-typed keys.
///
/// Returns the next cursor and the page's key names. `count` is a hint for
/// the page size; `None` leaves it to the server default.
pub(crate) async fn scan_page(
    conn: &mut ConnectionManager,
    cursor: u64,
    pattern: &str,
    count: Option<usize>,
) -> StoreResult<(u64, Vec<String>)> {
    let mut cmd = redis::cmd("SCAN");
    cmd.arg(cursor).arg("MATCH").arg(pattern);
    if let Some(count) = count {
        cmd.arg("COUNT").arg(count);
    }
    cmd.arg("TYPE").arg("string");

    let (next, keys): (u64, Vec<String>) = cmd.query_async(conn).await?;
    debug!(cursor, next, page_len = keys.len(), pattern, "scan page");
    Ok((next, keys))
}

/// Fetch values for a page of key names with one MGET.
///
/// Same length and order as the input; absent keys map to `None`.
pub(crate) async fn mget_values(
    conn: &mut ConnectionManager,
    keys: &[String],
) -> StoreResult<Vec<Option<Vec<u8>>>> {
    let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET").arg(keys).query_async(conn).await?;
    Ok(values)
}

/// Lazy, pull-based iterator over a namespace's key/value pairs.
///
/// Created by [`crate::RedisStore::iter`]. One page is fetched on demand
/// (SCAN, then a single MGET for the page's keys), fully materialized, and
/// drained entry by entry before the next page is touched. A consumer that
/// stops calling [`ScanIter::next`] therefore never pays for the pages it
/// did not reach; dropping the iterator is the only cancellation needed.
///
/// Each iterator is a fresh scan from cursor `0` and is not restartable.
/// It holds its own connection handle and a snapshot of the adapter's
/// options taken at creation, so option changes on the store do not affect
/// a scan already in flight.
pub struct ScanIter {
    conn: ConnectionManager,
    keyspace: Keyspace,
    pattern: String,
    /// Strip the namespace prefix before yielding (namespaced scans only)
    strip_prefix: bool,
    /// Drop keys containing the separator (unprefixed-only iteration)
    filter_unprefixed: bool,
    cursor: u64,
    buffer: VecDeque<(String, Vec<u8>)>,
    done: bool,
}

impl ScanIter {
    pub(crate) fn new(
        conn: ConnectionManager,
        keyspace: Keyspace,
        filter_unprefixed: bool,
    ) -> Self {
        let pattern = keyspace.pattern();
        let strip_prefix = keyspace.has_namespace();
        Self {
            conn,
            keyspace,
            pattern,
            strip_prefix,
            filter_unprefixed,
            cursor: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Produce the next `(raw_key, value)` pair, fetching a new page only
    /// when the current one is exhausted.
    ///
    /// Keys whose value resolves to Redis nil between the SCAN and the MGET
    /// are skipped, consistent with `get` treating nil as absent.
    ///
    /// ## Returns
    /// - `Ok(Some((key, value)))` while entries remain
    /// - `Ok(None)` once the scan cycle has completed
    /// - `Err(...)` on a remote-store failure; the iterator is finished
    ///   afterwards
    pub async fn next(&mut self) -> StoreResult<Option<(String, Vec<u8>)>> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Ok(Some(entry));
            }
            if self.done {
                return Ok(None);
            }

            let page = scan_page(&mut self.conn, self.cursor, &self.pattern, None).await;
            let (next, mut keys) = match page {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            self.cursor = next;
            if next == 0 {
                self.done = true;
            }

            if self.filter_unprefixed {
                keys.retain(|k| self.keyspace.is_unprefixed(k));
            }
            if keys.is_empty() {
                continue;
            }

            let values = match mget_values(&mut self.conn, &keys).await {
                Ok(values) => values,
                Err(e) => {
                    self.done = true;
                    return Err(e);
                }
            };
            for (key, value) in keys.into_iter().zip(values) {
                if let Some(value) = value {
                    let key = if self.strip_prefix {
                        self.keyspace.decode(&key)
                    } else {
                        key
                    };
                    self.buffer.push_back((key, value));
                }
            }
        }
    }

    /// Adapt the iterator into a [`Stream`] of results.
    ///
    /// The stream ends after the first error (the underlying cursor is no
    /// longer usable at that point).
    pub fn into_stream(self) -> impl Stream<Item = StoreResult<(String, Vec<u8>)>> + Send {
        futures::stream::unfold(self, |mut iter| async move {
            match iter.next().await {
                Ok(Some(entry)) => Some((Ok(entry), iter)),
                Ok(None) => None,
                Err(e) => Some((Err(e), iter)),
            }
        })
    }
}

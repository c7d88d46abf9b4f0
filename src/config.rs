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

//! Configuration for the Redis store adapter.
//!
//! ## Purpose
//! Explicit and environment-based configuration of the adapter's connection
//! URL and runtime options.
//!
//! ## Environment Variables
//! - `REDIS_KV_URL`: Redis server URL (default: "redis://localhost:6379")
//! - `REDIS_KV_NAMESPACE`: key namespace prefix (default: unset)
//! - `REDIS_KV_SEPARATOR`: namespace/key separator (default: "::")
//! - `REDIS_KV_DEFAULT_TTL_MS`: default TTL in milliseconds (default: unset)
//! - `REDIS_KV_USE_UNLINK`: "true"/"false", non-blocking bulk delete
//!   (default: true)
//! - `REDIS_KV_CLEAR_BATCH_SIZE`: SCAN page size for `clear` (default: 1000)
//! - `REDIS_KV_NO_NAMESPACE_AFFECTS_ALL`: "true"/"false", whether
//!   clear/iterate with no namespace touch the whole keyspace
//!   (default: false)
//!
//! ## Examples
//! ```bash
//! export REDIS_KV_URL=redis://localhost:6379
//! export REDIS_KV_NAMESPACE=myapp
//! export REDIS_KV_DEFAULT_TTL_MS=60000
//! ```

use crate::error::{StoreError, StoreResult};
use crate::keyspace::DEFAULT_SEPARATOR;
use std::time::Duration;

/// Default SCAN page size used by `clear`.
pub const DEFAULT_CLEAR_BATCH_SIZE: usize = 1000;

/// Redis store configuration.
///
/// All option fields map one-to-one onto the mutable runtime options of
/// [`crate::RedisStore`]; construction from a config simply seeds them.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis server URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Current logical partition; `None` means the unpartitioned keyspace
    pub namespace: Option<String>,
    /// Joins namespace and raw key in stored key names
    pub key_prefix_separator: String,
    /// Applied when a per-call TTL is omitted
    pub default_ttl: Option<Duration>,
    /// Use UNLINK (non-blocking) instead of DEL for bulk removal
    pub use_unlink: bool,
    /// Maximum keys enumerated per SCAN page during `clear`
    pub clear_batch_size: usize,
    /// When true and no namespace is set, clear/iterate cover the entire
    /// keyspace instead of only unprefixed keys
    pub no_namespace_affects_all: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            namespace: None,
            key_prefix_separator: DEFAULT_SEPARATOR.to_string(),
            default_ttl: None,
            use_unlink: true,
            clear_batch_size: DEFAULT_CLEAR_BATCH_SIZE,
            no_namespace_affects_all: false,
        }
    }
}

impl RedisConfig {
    /// Create a configuration with the given URL and default options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the complete variable list.
    /// Unparsable numeric or boolean values are rejected with
    /// [`StoreError::Config`] rather than silently defaulted.
    pub fn from_env() -> StoreResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("REDIS_KV_URL") {
            config.url = url;
        }
        if let Ok(ns) = std::env::var("REDIS_KV_NAMESPACE") {
            if !ns.is_empty() {
                config.namespace = Some(ns);
            }
        }
        if let Ok(sep) = std::env::var("REDIS_KV_SEPARATOR") {
            config.key_prefix_separator = sep;
        }
        if let Ok(ttl) = std::env::var("REDIS_KV_DEFAULT_TTL_MS") {
            let ms: u64 = ttl.parse().map_err(|_| {
                StoreError::Config(format!("invalid REDIS_KV_DEFAULT_TTL_MS: {}", ttl))
            })?;
            config.default_ttl = Some(Duration::from_millis(ms));
        }
        if let Ok(v) = std::env::var("REDIS_KV_USE_UNLINK") {
            config.use_unlink = parse_bool("REDIS_KV_USE_UNLINK", &v)?;
        }
        if let Ok(v) = std::env::var("REDIS_KV_CLEAR_BATCH_SIZE") {
            config.clear_batch_size = v.parse().map_err(|_| {
                StoreError::Config(format!("invalid REDIS_KV_CLEAR_BATCH_SIZE: {}", v))
            })?;
        }
        if let Ok(v) = std::env::var("REDIS_KV_NO_NAMESPACE_AFFECTS_ALL") {
            config.no_namespace_affects_all = parse_bool("REDIS_KV_NO_NAMESPACE_AFFECTS_ALL", &v)?;
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> StoreResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(StoreError::Config(format!(
            "invalid {}: {} (expected true/false)",
            name, other
        ))),
    }
}

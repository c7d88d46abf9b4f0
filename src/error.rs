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

//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
///
/// Remote-store failures inside single-key and batch operations are never
/// caught by the adapter; they surface to the caller as
/// [`StoreError::Backend`]. Failures inside the `clear` scan loop are the
/// one exception — see [`crate::ClearReport`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error reported by the Redis client (network, protocol, server).
    #[error("redis error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

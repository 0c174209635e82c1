//! Cache module for memoizing API responses in memory
//!
//! This module provides an expiring key/value store with a fixed TTL per entry,
//! plus the key-building convention shared by every data client. Entries live for
//! the lifetime of the process; nothing is persisted.

pub mod keys;
mod store;

pub use keys::{normalize_param, CacheKey};
pub use store::{ExpiringCache, DEFAULT_TTL};

//! Cache module for holding upstream responses in memory
//!
//! This module provides a TTL cache store keyed by prefixed strings. Entries carry
//! the time they were written; freshness is computed lazily by callers, and entries
//! of any age stay readable so callers can fall back to stale data when the
//! upstream API is unavailable.

mod store;

pub use store::{read, write, CacheEntry, CacheStore, MemoryCache};

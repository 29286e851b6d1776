//! TTL cache for dataview.
//!
//! Generic in-memory cache with per-entry expiration and optional capacity bound.
//! Expiry is lazy: there is no background sweeper.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;

pub use cache::{CacheConfig, CacheStats, TtlCache};

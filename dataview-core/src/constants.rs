//! Default tuning values.
//!
//! Taken from the list, calendar and search views that consume this crate.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// How long a fetched calendar month stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Capacity of an unbounded cache's initial allocation.
pub const DEFAULT_CACHE_CAPACITY_HINT: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// SEARCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Inactivity window before a typed query is sent.
pub const DEFAULT_SEARCH_DELAY: Duration = Duration::from_millis(300);

/// Shortest query (in characters) that reaches the loader.
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 2;

/// Number of distinct queries kept by the cached search variant.
pub const DEFAULT_SEARCH_CACHE_ENTRIES: usize = 50;

/// Lifetime of a cached search result.
pub const DEFAULT_SEARCH_CACHE_TTL: Duration = Duration::from_secs(3 * 60);

// ═══════════════════════════════════════════════════════════════════════════════
// VIRTUALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Rows rendered above and below the viewport.
pub const DEFAULT_OVERSCAN: usize = 5;

//! Domain types for dataview.
//!
//! - [`QueryKey`]: anything that derives a stable cache key from query parameters
//! - [`MonthKey`]: the `"YYYY-MM"` composite used by calendar views
//! - [`to_millis`]: duration to milliseconds for `*_ms` config fields

mod key;
mod millis;

pub use key::*;
pub use millis::to_millis;

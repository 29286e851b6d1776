//! # Dataview Core
//!
//! Core types, errors, and traits for the dataview data-access layer.
//!
//! This crate provides the building blocks shared by the cache, fetch, search and
//! virtualization crates:
//!
//! - **Errors**: one cloneable error type so a single outcome can fan out to many callers
//! - **Traits**: loader contracts and the scheduler abstraction for timers
//! - **Types**: cache key derivation (`QueryKey`, `MonthKey`)
//! - **Constants**: default delays, TTLs and sizes
//!
//! ## Example
//!
//! ```rust
//! use dataview_core::{MonthKey, QueryKey};
//!
//! let march = MonthKey::new(2024, 3).unwrap();
//! assert_eq!(march.cache_key(), "2024-03");
//! assert_eq!(march.next().cache_key(), "2024-04");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{DataviewError, Result};
pub use tokio_util::sync::CancellationToken;
pub use traits::*;
pub use types::*;

//! # Dataview Fetch
//!
//! Keyed data loading for views that page through remote data.
//!
//! - [`FetchCoordinator`]: cache first, then one shared load per key no matter how
//!   many callers ask at once
//! - [`ResourceView`]: a consumer's handle that tracks the wanted key and ignores
//!   results that arrive after the user moved on
//!
//! ## Example
//!
//! ```rust,no_run
//! use dataview_core::MonthKey;
//! use dataview_fetch::FetchCoordinator;
//!
//! # async fn demo() -> dataview_core::Result<()> {
//! let coordinator: FetchCoordinator<Vec<u32>> = FetchCoordinator::new();
//! let march = MonthKey::new(2024, 3)?;
//!
//! let days = coordinator
//!     .fetch_data(march, |month| async move { Ok(vec![month.month(); 31]) })
//!     .await?;
//! assert_eq!(days.len(), 31);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod coordinator;
mod resource;

pub use coordinator::{FetchConfig, FetchCoordinator};
pub use resource::{ResourceConfig, ResourceSnapshot, ResourceView, Source};

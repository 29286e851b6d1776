//! # Dataview Search
//!
//! Search-as-you-type without the races.
//!
//! [`DebouncedSearchController`] waits for the user to stop typing, cancels work that
//! a newer keystroke made pointless, and fences every response with a ticket so only
//! the most recent query can change what is on screen. An optional bounded cache
//! answers repeated queries without calling the loader.
//!
//! Timers go through the [`Scheduler`](dataview_core::Scheduler) trait;
//! [`TokioScheduler`] is the runtime-backed implementation.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod controller;
mod timer;

pub use controller::{
    DebouncedSearchController, SearchCacheConfig, SearchConfig, SearchPhase, SearchSnapshot,
};
pub use timer::TokioScheduler;

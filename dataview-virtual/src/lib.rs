//! # Dataview Virtual
//!
//! Windowing math for long lists of fixed-height rows.
//!
//! Given a scroll offset and the list geometry, [`WindowGeometry::window`] says which
//! rows intersect the viewport, which rows to actually render (the visible rows plus
//! an overscan buffer), and how far to translate the rendered block. Short lists that
//! fit in a viewport plus overscan are not virtualized at all.
//!
//! ## Example
//!
//! ```rust
//! use dataview_virtual::WindowGeometry;
//!
//! let geometry = WindowGeometry::new(1000, 50.0, 500.0).overscan(5);
//! let window = geometry.window(1000.0).unwrap();
//!
//! assert_eq!(window.render_range(), 15..35);
//! assert_eq!(window.offset_y, 750.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod engine;
mod list;

pub use engine::{Align, IndexSpan, VirtualWindow, WindowGeometry};
pub use list::{VirtualItem, VirtualList, VirtualListState};

//! A scrollable list that keeps its own window up to date.

use serde::Serialize;

use dataview_core::error::{DataviewError, Result};

use crate::engine::{Align, VirtualWindow, WindowGeometry};

/// One row to render.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VirtualItem<'a, T> {
    /// The row's data
    pub data: &'a T,
    /// Position in the list
    pub index: usize,
    /// Whether the row intersects the viewport (false for overscan rows)
    pub is_visible: bool,
    /// Offset of the row's top edge from the top of the list
    pub top: f64,
    /// Row height
    pub height: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VirtualListState<'a, T> {
    /// Rows to render, in order
    pub virtual_items: Vec<VirtualItem<'a, T>>,
    /// Height of the scrollable content
    pub total_height: f64,
    /// Translation for the rendered block
    pub offset_y: f64,
    /// False when every row is rendered
    pub is_virtualized: bool,
}

/// Items plus geometry plus scroll position.
#[derive(Clone, Debug)]
pub struct VirtualList<T> {
    items: Vec<T>,
    geometry: WindowGeometry,
    scroll_top: f64,
}

impl<T> VirtualList<T> {
    /// Creates a list scrolled to the top.
    pub fn new(items: Vec<T>, item_height: f64, container_height: f64) -> Result<Self> {
        let geometry = WindowGeometry::new(items.len(), item_height, container_height);
        geometry.validate()?;
        Ok(Self {
            items,
            geometry,
            scroll_top: 0.0,
        })
    }

    /// Sets the overscan.
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.geometry = self.geometry.overscan(overscan);
        self
    }

    /// Returns the items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the current geometry.
    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    /// Returns the current scroll offset.
    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Records a scroll event.
    pub fn on_scroll(&mut self, scroll_top: f64) -> Result<()> {
        if !scroll_top.is_finite() {
            return Err(DataviewError::InvalidGeometry(format!(
                "scroll offset must be finite, got {}",
                scroll_top
            )));
        }
        self.scroll_top = scroll_top.max(0.0);
        Ok(())
    }

    /// Replaces the items, pulling the scroll offset back if the list got shorter.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.geometry.item_count = self.items.len();
        self.scroll_top = self.scroll_top.min(self.geometry.max_scroll());
    }

    /// Resizes the viewport.
    pub fn set_container_height(&mut self, container_height: f64) -> Result<()> {
        let geometry = WindowGeometry {
            container_height,
            ..self.geometry
        };
        geometry.validate()?;
        self.geometry = geometry;
        self.scroll_top = self.scroll_top.min(self.geometry.max_scroll());
        Ok(())
    }

    /// Scrolls so that row `index` is in view and returns the new offset.
    pub fn scroll_to_item(&mut self, index: usize, align: Align) -> f64 {
        self.scroll_top = self
            .geometry
            .scroll_offset_unchecked(index, align, self.scroll_top);
        self.scroll_top
    }

    /// Returns the current window.
    pub fn window(&self) -> VirtualWindow {
        self.geometry.window_unchecked(self.scroll_top)
    }

    /// Returns the rows to render for the current scroll offset.
    pub fn state(&self) -> VirtualListState<'_, T> {
        let window = self.window();
        let height = self.geometry.item_height;

        let virtual_items = window
            .render_range()
            .filter_map(|index| {
                self.items.get(index).map(|data| VirtualItem {
                    data,
                    index,
                    is_visible: window.is_visible(index),
                    top: index as f64 * height,
                    height,
                })
            })
            .collect();

        VirtualListState {
            virtual_items,
            total_height: window.total_height,
            offset_y: window.offset_y,
            is_virtualized: window.is_virtualized,
        }
    }
}

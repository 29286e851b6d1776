//! Window computation for fixed-height rows.

use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use dataview_core::constants::DEFAULT_OVERSCAN;
use dataview_core::error::{DataviewError, Result};

/// Where a row should land when scrolling to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    /// Row top at the viewport top
    #[default]
    Start,
    /// Row centred in the viewport
    Center,
    /// Row bottom at the viewport bottom
    End,
    /// Scroll as little as possible to bring the row fully into view
    Auto,
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
            Align::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for Align {
    type Err = DataviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Align::Start),
            "center" | "centre" => Ok(Align::Center),
            "end" => Ok(Align::End),
            "auto" => Ok(Align::Auto),
            other => Err(DataviewError::ConfigError(format!(
                "unknown alignment '{}', expected start, center, end or auto",
                other
            ))),
        }
    }
}

/// An inclusive, non-empty run of row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpan {
    /// First index
    pub start: usize,
    /// Last index, inclusive
    pub end: usize,
}

impl IndexSpan {
    /// Number of rows in the span.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; an empty run is represented by `None`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `index` falls inside the span.
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Iterates the indices in the span.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Result of a window computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VirtualWindow {
    /// Rows intersecting the viewport
    pub visible: Option<IndexSpan>,
    /// Rows to render: the visible rows plus overscan, or every row when not virtualized
    pub render: Option<IndexSpan>,
    /// Height of the whole list
    pub total_height: f64,
    /// Translation to apply to the rendered block
    pub offset_y: f64,
    /// False when the list is short enough to render in full
    pub is_virtualized: bool,
}

impl VirtualWindow {
    fn empty() -> Self {
        Self {
            visible: None,
            render: None,
            total_height: 0.0,
            offset_y: 0.0,
            is_virtualized: false,
        }
    }

    /// Rows to render as a half-open range.
    pub fn render_range(&self) -> Range<usize> {
        match self.render {
            Some(span) => span.start..span.end + 1,
            None => 0..0,
        }
    }

    /// Returns true if row `index` intersects the viewport.
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.is_some_and(|span| span.contains(index))
    }
}

/// Geometry of a fixed-height list and its viewport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    /// Number of rows
    pub item_count: usize,
    /// Height of every row
    pub item_height: f64,
    /// Height of the scrolling viewport
    pub container_height: f64,
    /// Extra rows rendered on each side of the visible rows
    pub overscan: usize,
}

impl WindowGeometry {
    /// Creates geometry with the default overscan.
    pub fn new(item_count: usize, item_height: f64, container_height: f64) -> Self {
        Self {
            item_count,
            item_height,
            container_height,
            overscan: DEFAULT_OVERSCAN,
        }
    }

    /// Sets the overscan.
    pub fn overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    /// Rejects geometry that would produce meaningless ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.item_height.is_finite() || self.item_height <= 0.0 {
            return Err(DataviewError::InvalidGeometry(format!(
                "item height must be a positive finite number, got {}",
                self.item_height
            )));
        }
        if !self.container_height.is_finite() || self.container_height < 0.0 {
            return Err(DataviewError::InvalidGeometry(format!(
                "container height must be a non-negative finite number, got {}",
                self.container_height
            )));
        }
        Ok(())
    }

    /// Height of the whole list.
    pub fn total_height(&self) -> f64 {
        self.item_count as f64 * self.item_height
    }

    /// Largest meaningful scroll offset.
    pub fn max_scroll(&self) -> f64 {
        (self.total_height() - self.container_height).max(0.0)
    }

    /// Rows needed to fill the viewport.
    pub fn rows_per_viewport(&self) -> usize {
        (self.container_height / self.item_height).ceil() as usize
    }

    /// Returns true if the list is too long to render in full.
    ///
    /// Lists of at most one viewport of rows plus overscan on both sides render in
    /// full.
    pub fn is_virtualized(&self) -> bool {
        self.item_count > self.rows_per_viewport().saturating_add(self.overscan.saturating_mul(2))
    }

    /// Computes the window for `scroll_top`.
    pub fn window(&self, scroll_top: f64) -> Result<VirtualWindow> {
        self.validate()?;
        check_offset(scroll_top)?;
        Ok(self.window_unchecked(scroll_top))
    }

    /// Computes the scroll offset that brings row `index` into view.
    ///
    /// `current` is the present scroll offset and only matters for [`Align::Auto`].
    /// Indices past the end refer to the last row. The result is clamped to
    /// `[0, max_scroll]`.
    pub fn scroll_offset(&self, index: usize, align: Align, current: f64) -> Result<f64> {
        self.validate()?;
        check_offset(current)?;
        Ok(self.scroll_offset_unchecked(index, align, current))
    }

    pub(crate) fn window_unchecked(&self, scroll_top: f64) -> VirtualWindow {
        if self.item_count == 0 {
            return VirtualWindow::empty();
        }

        let last = self.item_count - 1;
        let scroll_top = scroll_top.max(0.0);
        let visible = self.visible_span(scroll_top, last);

        if !self.is_virtualized() {
            return VirtualWindow {
                visible,
                render: Some(IndexSpan { start: 0, end: last }),
                total_height: self.total_height(),
                offset_y: 0.0,
                is_virtualized: false,
            };
        }

        let render = visible.map(|span| IndexSpan {
            start: span.start.saturating_sub(self.overscan),
            end: span.end.saturating_add(self.overscan).min(last),
        });
        let offset_y = render.map_or(0.0, |span| span.start as f64 * self.item_height);

        VirtualWindow {
            visible,
            render,
            total_height: self.total_height(),
            offset_y,
            is_virtualized: true,
        }
    }

    pub(crate) fn scroll_offset_unchecked(&self, index: usize, align: Align, current: f64) -> f64 {
        if self.item_count == 0 {
            return 0.0;
        }

        let index = index.min(self.item_count - 1);
        let top = index as f64 * self.item_height;
        let bottom = top + self.item_height;
        let viewport = self.container_height;

        let target = match align {
            Align::Start => top,
            Align::End => bottom - viewport,
            Align::Center => top + self.item_height / 2.0 - viewport / 2.0,
            Align::Auto => {
                if top < current {
                    top
                } else if bottom > current + viewport {
                    bottom - viewport
                } else {
                    current
                }
            }
        };

        target.clamp(0.0, self.max_scroll())
    }

    /// Rows whose extent intersects `[scroll_top, scroll_top + container_height)`.
    fn visible_span(&self, scroll_top: f64, last: usize) -> Option<IndexSpan> {
        if self.container_height <= 0.0 {
            return None;
        }

        let start = ((scroll_top / self.item_height).floor() as usize).min(last);
        let past_end = ((scroll_top + self.container_height) / self.item_height).ceil() as usize;
        let end = past_end.saturating_sub(1).clamp(start, last);

        Some(IndexSpan { start, end })
    }
}

fn check_offset(offset: f64) -> Result<()> {
    if offset.is_finite() {
        Ok(())
    } else {
        Err(DataviewError::InvalidGeometry(format!(
            "scroll offset must be finite, got {}",
            offset
        )))
    }
}

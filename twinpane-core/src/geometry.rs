// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Scroll geometry of the two panes.

/// One of the two synchronized panes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    /// The raw text buffer
    Source,
    /// The rendered block view
    Preview,
}

impl Pane {
    pub fn other(self) -> Pane {
        match self {
            Pane::Source => Pane::Preview,
            Pane::Preview => Pane::Source,
        }
    }
}

/// Live scroll geometry of a pane, in the pane's own units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaneGeometry {
    /// Current scroll offset
    pub scroll_top: f64,
    /// Total content height
    pub scroll_height: f64,
    /// Viewport height
    pub client_height: f64,
    /// Padding above the content inside the scrollable area
    pub padding_top: f64,
}

impl PaneGeometry {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
            padding_top: 0.0,
        }
    }

    pub fn with_padding_top(mut self, padding_top: f64) -> Self {
        self.padding_top = padding_top;
        self
    }

    /// Content height minus viewport height, possibly zero or negative
    pub fn raw_scrollable_range(&self) -> f64 {
        self.scroll_height - self.client_height
    }

    /// True when the content fits in the viewport and there is nothing to scroll
    pub fn is_degenerate(&self) -> bool {
        let range = self.raw_scrollable_range();
        range.is_nan() || range <= 0.0
    }

    /// Maximum scroll offset, floored at 1 so it is always a safe divisor
    pub fn scrollable_range(&self) -> f64 {
        let range = self.raw_scrollable_range();
        if range.is_finite() {
            range.max(1.0)
        } else {
            1.0
        }
    }

    /// Clamp an offset into `[0, scrollable_range]`
    pub fn clamp_offset(&self, offset: f64) -> f64 {
        if offset.is_finite() {
            offset.clamp(0.0, self.scrollable_range())
        } else {
            0.0
        }
    }

    /// Position of `offset` as a fraction of the scrollable range; 0 when the
    /// pane cannot scroll
    pub fn scroll_ratio(&self, offset: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (self.clamp_offset(offset) / self.scrollable_range()).clamp(0.0, 1.0)
    }

    /// Whether `offset` is at (or past) the bottom of a scrollable pane
    pub fn is_at_bottom(&self, offset: f64) -> bool {
        !self.is_degenerate() && offset >= self.raw_scrollable_range()
    }
}

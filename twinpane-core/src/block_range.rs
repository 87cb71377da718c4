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

//! Block ranges of the rendered pane.
//!
//! The host hands over its rendered block tree as [`RenderedNode`]s: screen
//! positions plus whatever source line annotation the parser attached. The
//! extractor turns that into an ascending list of [`BlockRange`]s positioned in
//! the pane's scrollable content coordinates.

use crate::geometry::PaneGeometry;

/// One node of the host's rendered block tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedNode {
    /// Inclusive 1-based source line span as annotated by the parser, if any.
    /// Values `<= 0` mean the parser did not track this node's position.
    pub lines: Option<(i64, i64)>,
    /// Top edge relative to the host's screen/window origin
    pub screen_top: f64,
    /// Bottom edge relative to the host's screen/window origin
    pub screen_bottom: f64,
    pub children: Vec<RenderedNode>,
}

impl RenderedNode {
    /// An annotated block
    pub fn block(start_line: i64, end_line: i64, screen_top: f64, screen_bottom: f64) -> Self {
        Self {
            lines: Some((start_line, end_line)),
            screen_top,
            screen_bottom,
            children: Vec::new(),
        }
    }

    /// An unannotated node that only groups children
    pub fn container(children: Vec<RenderedNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<RenderedNode>) -> Self {
        self.children = children;
        self
    }

    fn valid_lines(&self) -> Option<(usize, usize)> {
        let (start, end) = self.lines?;
        if start <= 0 || end <= 0 {
            return None;
        }
        let start = usize::try_from(start).ok()?;
        let end = usize::try_from(end).ok()?;
        Some((start, end.max(start)))
    }
}

/// A rendered block's source line span and pixel band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRange {
    pub start_line: usize,
    pub end_line: usize,
    pub top: f64,
    pub bottom: f64,
}

impl BlockRange {
    pub fn new(start_line: usize, end_line: usize, top: f64, bottom: f64) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
            top,
            bottom: bottom.max(top),
        }
    }

    pub fn contains_line(&self, line_float: f64) -> bool {
        self.start_line as f64 <= line_float && line_float <= self.end_line as f64
    }

    pub fn contains_offset(&self, offset: f64) -> bool {
        self.top <= offset && offset <= self.bottom
    }

    pub fn line_span(&self) -> f64 {
        (self.end_line - self.start_line) as f64
    }

    pub fn pixel_span(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Collect the annotated blocks of a rendered tree.
///
/// `viewport_top` is the screen position of the top of the preview pane's
/// viewport; `geometry` is that pane's current scroll geometry. Nodes without a
/// usable annotation are skipped and their children searched instead; an
/// annotated node is taken whole. The result is sorted by `(start_line, top)`.
pub fn extract_block_ranges(
    nodes: &[RenderedNode],
    viewport_top: f64,
    geometry: &PaneGeometry,
) -> Vec<BlockRange> {
    let content_shift = geometry.scroll_top - viewport_top - geometry.padding_top;
    let mut ranges = Vec::new();
    let mut pending: Vec<&RenderedNode> = nodes.iter().rev().collect();
    let mut skipped = 0usize;

    while let Some(node) = pending.pop() {
        let finite = node.screen_top.is_finite() && node.screen_bottom.is_finite();
        match node.valid_lines() {
            Some((start, end)) if finite => {
                ranges.push(BlockRange::new(
                    start,
                    end,
                    node.screen_top + content_shift,
                    node.screen_bottom + content_shift,
                ));
            }
            _ => {
                if node.lines.is_some() {
                    skipped += 1;
                }
                pending.extend(node.children.iter().rev());
            }
        }
    }

    ranges.sort_by(|a, b| {
        a.start_line
            .cmp(&b.start_line)
            .then_with(|| a.top.total_cmp(&b.top))
    });

    if skipped > 0 {
        tracing::trace!(skipped, "dropped blocks with unusable line annotations");
    }
    ranges
}

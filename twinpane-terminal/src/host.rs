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

//! The two panes as the terminal shows them, scrolled in whole rows.

use twinpane_core::config::PreviewConfig;
use twinpane_core::{Pane, PaneGeometry, PaneHost, RenderedNode, SourceBuffer};

use crate::cell_measure::wrap_line;
use crate::preview::{parse_blocks, PreviewBlock, PreviewLayout};

pub const HEADER_HEIGHT: u16 = 1;
pub const STATUS_HEIGHT: u16 = 1;
pub const SEPARATOR_WIDTH: u16 = 1;

/// One wrapped row of the source pane
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// 1-based source line the row belongs to
    pub line: usize,
    /// First row of its line; only these get a line number
    pub first: bool,
    pub text: String,
}

/// Column and row extents of the split screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLayout {
    pub columns: u16,
    pub rows: u16,
}

impl SplitLayout {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }

    /// Rows available to each pane's content
    pub fn body_rows(&self) -> u16 {
        self.rows.saturating_sub(HEADER_HEIGHT + STATUS_HEIGHT)
    }

    pub fn source_columns(&self) -> u16 {
        self.columns.saturating_sub(SEPARATOR_WIDTH) / 2
    }

    pub fn separator_column(&self) -> u16 {
        self.source_columns()
    }

    pub fn preview_column(&self) -> u16 {
        self.source_columns() + SEPARATOR_WIDTH
    }

    pub fn preview_columns(&self) -> u16 {
        self.columns.saturating_sub(self.preview_column())
    }

    /// Pane under screen column `x`; the separator belongs to neither
    pub fn pane_at(&self, x: u16) -> Option<Pane> {
        if x < self.separator_column() {
            Some(Pane::Source)
        } else if x >= self.preview_column() {
            Some(Pane::Preview)
        } else {
            None
        }
    }
}

pub struct SplitHost {
    source: SourceBuffer,
    source_rows: Vec<SourceRow>,
    layout: SplitLayout,
    preview_config: PreviewConfig,
    preview: PreviewLayout,
    tree: Vec<RenderedNode>,
    scroll: [usize; 2],
    /// Panes whose scroll position was set by `write_scroll` and not yet
    /// reported back as scroll events
    echoes: Vec<Pane>,
}

impl SplitHost {
    pub fn new(source: SourceBuffer, layout: SplitLayout, preview_config: PreviewConfig) -> Self {
        let mut host = Self {
            source,
            source_rows: Vec::new(),
            layout,
            preview_config,
            preview: PreviewLayout::default(),
            tree: Vec::new(),
            scroll: [0, 0],
            echoes: Vec::new(),
        };
        host.relayout();
        host
    }

    pub fn source_buffer(&self) -> &SourceBuffer {
        &self.source
    }

    pub fn layout(&self) -> SplitLayout {
        self.layout
    }

    pub fn source_rows(&self) -> &[SourceRow] {
        &self.source_rows
    }

    pub fn preview_layout(&self) -> &PreviewLayout {
        &self.preview
    }

    /// Replace the source text, reparse the preview and keep both panes in range
    pub fn reload(&mut self, text: &str) {
        if self.source.text() == text {
            return;
        }
        self.source.replace(text);
        self.relayout();
    }

    pub fn resize(&mut self, layout: SplitLayout) {
        if layout != self.layout {
            self.layout = layout;
            self.relayout();
        }
    }

    /// Width of the line number gutter, separator space included
    pub fn gutter_width(&self) -> u16 {
        let digits = self.source.line_count().max(1).ilog10() as u16 + 1;
        digits + 1
    }

    /// Columns the source text wraps at
    pub fn source_text_columns(&self) -> u16 {
        self.layout
            .source_columns()
            .saturating_sub(self.gutter_width())
    }

    pub fn scroll_top(&self, pane: Pane) -> usize {
        self.scroll[index(pane)]
    }

    pub fn content_rows(&self, pane: Pane) -> usize {
        match pane {
            Pane::Source => self.source_rows.len(),
            Pane::Preview => self.preview.height(),
        }
    }

    pub fn max_scroll(&self, pane: Pane) -> usize {
        self.content_rows(pane)
            .saturating_sub(usize::from(self.layout.body_rows()))
    }

    /// Scroll `pane` to row `top`, clamped; true if the position moved
    pub fn set_scroll(&mut self, pane: Pane, top: usize) -> bool {
        let top = top.min(self.max_scroll(pane));
        let slot = &mut self.scroll[index(pane)];
        if *slot == top {
            return false;
        }
        *slot = top;
        if pane == Pane::Preview {
            self.project();
        }
        true
    }

    pub fn scroll_by(&mut self, pane: Pane, delta: isize) -> bool {
        let top = self.scroll_top(pane).saturating_add_signed(delta);
        self.set_scroll(pane, top)
    }

    /// Scroll events produced by programmatic writes since the last drain
    pub fn drain_echoes(&mut self) -> Vec<Pane> {
        std::mem::take(&mut self.echoes)
    }

    fn relayout(&mut self) {
        let columns = usize::from(self.source_text_columns());
        self.source_rows = self
            .source
            .lines()
            .enumerate()
            .flat_map(|(index, text)| {
                wrap_line(&text, columns)
                    .into_iter()
                    .enumerate()
                    .map(move |(row, text)| SourceRow {
                        line: index + 1,
                        first: row == 0,
                        text,
                    })
            })
            .collect();

        let blocks: Vec<PreviewBlock> = parse_blocks(&self.source);
        self.preview = PreviewLayout::build(
            &blocks,
            usize::from(self.layout.preview_columns()),
            &self.preview_config,
        );

        for pane in [Pane::Source, Pane::Preview] {
            let top = self.scroll_top(pane).min(self.max_scroll(pane));
            self.scroll[index(pane)] = top;
        }
        self.project();
    }

    fn project(&mut self) {
        let scroll_top = self.scroll_top(Pane::Preview);
        let viewport_top = usize::from(HEADER_HEIGHT);
        self.tree = self.preview.project(scroll_top, viewport_top);
    }
}

fn index(pane: Pane) -> usize {
    match pane {
        Pane::Source => 0,
        Pane::Preview => 1,
    }
}

impl PaneHost for SplitHost {
    fn geometry(&self, pane: Pane) -> PaneGeometry {
        let geometry = PaneGeometry::new(
            self.scroll_top(pane) as f64,
            self.content_rows(pane) as f64,
            f64::from(self.layout.body_rows()),
        );
        match pane {
            Pane::Source => geometry,
            Pane::Preview => geometry.with_padding_top(self.preview.padding_top as f64),
        }
    }

    fn source(&self) -> &SourceBuffer {
        &self.source
    }

    fn source_width(&self) -> f64 {
        f64::from(self.source_text_columns())
    }

    fn block_tree(&self) -> &[RenderedNode] {
        &self.tree
    }

    fn preview_viewport_top(&self) -> f64 {
        f64::from(HEADER_HEIGHT)
    }

    fn write_scroll(&mut self, pane: Pane, offset: f64) {
        let top = if offset.is_finite() {
            offset.round().max(0.0) as usize
        } else {
            0
        };
        if self.set_scroll(pane, top) {
            self.echoes.push(pane);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_measure::{cell_font, CellMeasure};
    use twinpane_core::config::SyncConfig;
    use twinpane_core::{ManualClock, SyncCoordinator, SyncOutcome};

    fn document(sections: usize) -> String {
        let mut text = String::new();
        for i in 0..sections {
            text.push_str(&format!(
                "## Section {i}\n\nA paragraph of prose that wraps across a few rows \
                 when the pane is narrow enough to force it.\n\n\
                 ```\nlet x = {i};\nlet y = x;\n```\n\n"
            ));
        }
        text
    }

    fn host(sections: usize) -> SplitHost {
        SplitHost::new(
            SourceBuffer::from_text(&document(sections)),
            SplitLayout::new(81, 22),
            PreviewConfig::default(),
        )
    }

    fn coordinator() -> SyncCoordinator<CellMeasure, ManualClock> {
        SyncCoordinator::with_clock(
            CellMeasure,
            cell_font(),
            &SyncConfig::default(),
            ManualClock::new(),
        )
    }

    #[test]
    fn test_split_layout() {
        let layout = SplitLayout::new(81, 22);
        assert_eq!(layout.body_rows(), 20);
        assert_eq!(layout.source_columns(), 40);
        assert_eq!(layout.separator_column(), 40);
        assert_eq!(layout.preview_column(), 41);
        assert_eq!(layout.preview_columns(), 40);
        assert_eq!(layout.pane_at(3), Some(Pane::Source));
        assert_eq!(layout.pane_at(40), None);
        assert_eq!(layout.pane_at(60), Some(Pane::Preview));
    }

    #[test]
    fn test_tiny_terminal_does_not_underflow() {
        let layout = SplitLayout::new(0, 1);
        assert_eq!(layout.body_rows(), 0);
        assert_eq!(layout.source_columns(), 0);
        assert_eq!(layout.preview_columns(), 0);

        let source = SourceBuffer::from_text("# a\n");
        let host = SplitHost::new(source, layout, PreviewConfig::default());
        assert_eq!(host.source_text_columns(), 0);
        let rows = host.content_rows(Pane::Source);
        assert_eq!(host.max_scroll(Pane::Source), rows);
    }

    #[test]
    fn test_source_rows_match_line_metrics() {
        let host = host(3);
        let mut coordinator = coordinator();
        let metrics = coordinator.line_metrics(&host);
        assert_eq!(metrics.line_count(), host.source_buffer().line_count());
        let rows = host.content_rows(Pane::Source);
        assert_eq!(metrics.content_height(), rows as f64);

        let first_rows: Vec<usize> = host
            .source_rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.first)
            .map(|(i, _)| i)
            .collect();
        for (line, row) in first_rows.iter().enumerate() {
            assert_eq!(metrics.top(line + 1), *row as f64);
        }
    }

    #[test]
    fn test_gutter_grows_with_line_count() {
        let small = SplitHost::new(
            SourceBuffer::from_text("a\nb"),
            SplitLayout::new(81, 22),
            PreviewConfig::default(),
        );
        assert_eq!(small.gutter_width(), 2);
        assert_eq!(host(20).gutter_width(), 4);
    }

    #[test]
    fn test_set_scroll_clamps() {
        let mut host = host(6);
        let max = host.max_scroll(Pane::Source);
        assert!(max > 0);
        assert!(host.set_scroll(Pane::Source, max + 50));
        assert_eq!(host.scroll_top(Pane::Source), max);
        assert!(!host.set_scroll(Pane::Source, max));
        assert!(host.scroll_by(Pane::Source, -1_000));
        assert_eq!(host.scroll_top(Pane::Source), 0);
    }

    #[test]
    fn test_write_scroll_records_echo() {
        let mut host = host(6);
        host.write_scroll(Pane::Preview, 4.4);
        assert_eq!(host.scroll_top(Pane::Preview), 4);
        assert_eq!(host.drain_echoes(), vec![Pane::Preview]);
        assert!(host.drain_echoes().is_empty());

        // No movement, no echo
        host.write_scroll(Pane::Preview, 4.0);
        assert!(host.drain_echoes().is_empty());

        host.write_scroll(Pane::Preview, f64::NAN);
        assert_eq!(host.scroll_top(Pane::Preview), 0);
    }

    #[test]
    fn test_preview_tree_follows_scroll() {
        let mut host = host(6);
        let before = host.block_tree()[0].screen_top;
        host.set_scroll(Pane::Preview, 3);
        let after = host.block_tree()[0].screen_top;
        assert_eq!(before - after, 3.0);
    }

    #[test]
    fn test_source_scroll_syncs_preview_and_echo_is_dropped() {
        let mut host = host(8);
        let mut coordinator = coordinator();

        host.set_scroll(Pane::Source, host.max_scroll(Pane::Source) / 2);
        let outcome = coordinator.on_scroll(Pane::Source, &mut host);
        let SyncOutcome::Applied { target, .. } = outcome else {
            panic!("expected a write, got {outcome:?}");
        };
        assert_eq!(target, Pane::Preview);
        assert!(host.scroll_top(Pane::Preview) > 0);

        let source_before = host.scroll_top(Pane::Source);
        for echo in host.drain_echoes() {
            let outcome = coordinator.on_scroll(echo, &mut host);
            assert_eq!(outcome, SyncOutcome::Suppressed);
        }
        assert_eq!(host.scroll_top(Pane::Source), source_before);
    }

    #[test]
    fn test_bottom_maps_to_bottom() {
        let mut host = host(8);
        let mut coordinator = coordinator();
        host.set_scroll(Pane::Source, host.max_scroll(Pane::Source));
        coordinator.on_scroll(Pane::Source, &mut host);
        assert_eq!(
            host.scroll_top(Pane::Preview),
            host.max_scroll(Pane::Preview)
        );
    }

    #[test]
    fn test_reload_keeps_scroll_in_range() {
        let mut host = host(8);
        host.set_scroll(Pane::Source, host.max_scroll(Pane::Source));
        host.set_scroll(Pane::Preview, host.max_scroll(Pane::Preview));

        host.reload("# short\n");
        assert_eq!(host.scroll_top(Pane::Source), 0);
        assert_eq!(host.scroll_top(Pane::Preview), 0);
        assert_eq!(host.source_buffer().line_count(), 2);
    }
}

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

//! Forward (source → preview) and inverse (preview → source) scroll mapping.
//!
//! Both directions go through a fractional line position: a source offset
//! becomes a line float via [`LineMetrics`], then a preview offset via the
//! bracketing [`BlockRange`]s, and the inverse retraces those steps. With no
//! block ranges at all, both directions fall back to proportional scrolling.
//! None of this can fail; bad input only costs precision.

use crate::block_range::BlockRange;
use crate::geometry::PaneGeometry;
use crate::line_metrics::LineMetrics;

/// Which rule produced a mapped offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRule {
    /// No block ranges; proportional to the scrollable ranges
    Proportional,
    /// Source pane at its top edge
    PinnedTop,
    /// Source pane at its bottom edge
    PinnedBottom,
    /// Interpolated inside one block
    WithinBlock,
    /// Interpolated across the gap between two blocks
    Gap,
    /// Before the first block
    BeforeFirst,
    /// Past the last block
    PastLast,
}

/// A mapped offset and the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapped {
    pub offset: f64,
    pub rule: MappingRule,
}

/// Everything one mapping call needs, borrowed for the duration of the call
#[derive(Debug, Clone, Copy)]
pub struct ScrollMapper<'a> {
    pub metrics: &'a LineMetrics,
    pub ranges: &'a [BlockRange],
    pub source: PaneGeometry,
    pub preview: PaneGeometry,
    /// Map the very top/bottom of one pane to the very top/bottom of the other
    pub pin_edges: bool,
}

impl<'a> ScrollMapper<'a> {
    pub fn new(
        metrics: &'a LineMetrics,
        ranges: &'a [BlockRange],
        source: PaneGeometry,
        preview: PaneGeometry,
    ) -> Self {
        Self {
            metrics,
            ranges,
            source,
            preview,
            pin_edges: true,
        }
    }

    pub fn with_pin_edges(mut self, pin_edges: bool) -> Self {
        self.pin_edges = pin_edges;
        self
    }

    /// Preview offset corresponding to a source scroll offset
    pub fn source_to_preview(&self, source_offset: f64) -> f64 {
        self.forward(source_offset).offset
    }

    /// Source offset corresponding to a preview scroll offset
    pub fn preview_to_source(&self, preview_offset: f64) -> f64 {
        self.inverse(preview_offset).offset
    }

    pub fn forward(&self, source_offset: f64) -> Mapped {
        let offset = self.source.clamp_offset(source_offset);
        let preview_max = self.preview.scrollable_range();

        let (target, rule) = if self.ranges.is_empty() {
            (
                self.source.scroll_ratio(offset) * preview_max,
                MappingRule::Proportional,
            )
        } else if self.pin_edges && offset <= 0.0 {
            (0.0, MappingRule::PinnedTop)
        } else if self.pin_edges && self.source.is_at_bottom(offset) {
            (preview_max, MappingRule::PinnedBottom)
        } else {
            let line_float = self.metrics.line_float_at(offset - self.source.padding_top);
            preview_offset_for_line(self.ranges, line_float, preview_max)
        };

        let mapped = Mapped {
            offset: clamp_target(&self.preview, target),
            rule,
        };
        tracing::debug!(
            from = offset,
            to = mapped.offset,
            rule = ?mapped.rule,
            "source -> preview"
        );
        mapped
    }

    pub fn inverse(&self, preview_offset: f64) -> Mapped {
        let offset = self.preview.clamp_offset(preview_offset);
        let source_max = self.source.scrollable_range();

        let (target, rule) = if self.ranges.is_empty() {
            (
                self.preview.scroll_ratio(offset) * source_max,
                MappingRule::Proportional,
            )
        } else if self.pin_edges && offset <= 0.0 {
            (0.0, MappingRule::PinnedTop)
        } else if self.pin_edges && self.preview.is_at_bottom(offset) {
            (source_max, MappingRule::PinnedBottom)
        } else {
            let (line_float, rule) = line_for_preview_offset(self.ranges, offset);
            (
                self.metrics.offset_of(line_float) + self.source.padding_top,
                rule,
            )
        };

        let mapped = Mapped {
            offset: clamp_target(&self.source, target),
            rule,
        };
        tracing::debug!(
            from = offset,
            to = mapped.offset,
            rule = ?mapped.rule,
            "preview -> source"
        );
        mapped
    }
}

/// A pane with nothing to scroll always receives 0
fn clamp_target(target: &PaneGeometry, offset: f64) -> f64 {
    if target.is_degenerate() {
        0.0
    } else {
        target.clamp_offset(offset)
    }
}

/// Index of the last element whose key is `<= value`. When several elements
/// share that key, the earliest one containing `value` wins, else the last of
/// them. `None` when every key is greater.
fn last_at_or_below<T>(
    items: &[T],
    value: f64,
    key: impl Fn(&T) -> f64,
    contains: impl Fn(&T) -> bool,
) -> Option<usize> {
    let past = items.partition_point(|item| key(item) <= value);
    if past == 0 {
        return None;
    }
    let found = key(&items[past - 1]);
    let first = items.partition_point(|item| key(item) < found);
    (first..past)
        .find(|&index| contains(&items[index]))
        .or(Some(past - 1))
}

/// Index of the first element whose key is `>= value`
fn first_at_or_above<T>(items: &[T], value: f64, key: impl Fn(&T) -> f64) -> Option<usize> {
    let index = items.partition_point(|item| key(item) < value);
    (index < items.len()).then_some(index)
}

/// Bracketing `(before, after)` indices, defaulting to the first and last range
fn bracket<T>(
    items: &[T],
    value: f64,
    key: impl Fn(&T) -> f64 + Copy,
    contains: impl Fn(&T) -> bool,
) -> (usize, usize) {
    let last = items.len() - 1;
    let before = last_at_or_below(items, value, key, contains).unwrap_or(0);
    let after = first_at_or_above(items, value, key).unwrap_or(last);
    (before, after)
}

/// Preview offset for a source line float. `ranges` must be non-empty.
fn preview_offset_for_line(
    ranges: &[BlockRange],
    line_float: f64,
    preview_max: f64,
) -> (f64, MappingRule) {
    let last = ranges[ranges.len() - 1];
    if line_float >= last.end_line as f64 {
        return (preview_max, MappingRule::PastLast);
    }

    let (before_index, after_index) = bracket(
        ranges,
        line_float,
        |r| r.start_line as f64,
        |r| r.contains_line(line_float),
    );
    let before = ranges[before_index];
    let after = ranges[after_index];

    if before.contains_line(line_float) {
        let span = before.line_span().max(1.0);
        let fraction = ((line_float - before.start_line as f64) / span).clamp(0.0, 1.0);
        (
            before.top + fraction * before.pixel_span(),
            MappingRule::WithinBlock,
        )
    } else if before_index == after_index {
        (before.top, MappingRule::BeforeFirst)
    } else {
        let line_gap = (after.start_line as f64 - before.end_line as f64).max(1.0);
        let fraction = ((line_float - before.end_line as f64) / line_gap).clamp(0.0, 1.0);
        (
            before.bottom + fraction * (after.top - before.bottom),
            MappingRule::Gap,
        )
    }
}

/// Source line float for a preview offset. `ranges` must be non-empty.
///
/// Ranges arrive sorted by start line, which need not agree with their
/// pixel order, so the search runs over a copy sorted by top.
fn line_for_preview_offset(ranges: &[BlockRange], offset: f64) -> (f64, MappingRule) {
    let mut by_top = ranges.to_vec();
    by_top.sort_by(|a, b| {
        a.top
            .total_cmp(&b.top)
            .then_with(|| a.start_line.cmp(&b.start_line))
    });
    let lowest = by_top
        .iter()
        .copied()
        .max_by(|a, b| a.bottom.total_cmp(&b.bottom));
    let Some(lowest) = lowest else {
        return (1.0, MappingRule::BeforeFirst);
    };
    if offset >= lowest.bottom {
        return (lowest.end_line as f64, MappingRule::PastLast);
    }

    let (before_index, after_index) =
        bracket(&by_top, offset, |r| r.top, |r| r.contains_offset(offset));
    let before = by_top[before_index];
    let after = by_top[after_index];

    if before.contains_offset(offset) {
        let fraction = ((offset - before.top) / before.pixel_span().max(1.0)).clamp(0.0, 1.0);
        (
            before.start_line as f64 + fraction * before.line_span(),
            MappingRule::WithinBlock,
        )
    } else if before_index == after_index {
        (before.start_line as f64, MappingRule::BeforeFirst)
    } else {
        let pixel_gap = (after.top - before.bottom).max(1.0);
        let fraction = ((offset - before.bottom) / pixel_gap).clamp(0.0, 1.0);
        let line_gap = after.start_line as f64 - before.end_line as f64;
        (
            before.end_line as f64 + fraction * line_gap,
            MappingRule::Gap,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_metrics::MetricsSource;

    fn uniform(lines: usize, height: f64) -> LineMetrics {
        LineMetrics::uniform(lines, height, MetricsSource::Measured)
    }

    fn approx(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    fn round_trip_ranges() -> Vec<BlockRange> {
        vec![
            BlockRange::new(1, 4, 0.0, 90.0),
            BlockRange::new(6, 10, 110.0, 220.0),
            BlockRange::new(12, 30, 260.0, 700.0),
            BlockRange::new(32, 60, 740.0, 1300.0),
            BlockRange::new(62, 100, 1340.0, 2000.0),
        ]
    }

    #[test]
    fn test_proportional_fallback_at_half() {
        let metrics = uniform(100, 10.0);
        let source = PaneGeometry::new(0.0, 1000.0, 200.0);
        let preview = PaneGeometry::new(0.0, 3000.0, 500.0);
        let mapper = ScrollMapper::new(&metrics, &[], source, preview);

        let forward = mapper.forward(400.0);
        assert_eq!(forward.rule, MappingRule::Proportional);
        approx(forward.offset, 1250.0, 0.5);
        approx(mapper.preview_to_source(1250.0), 400.0, 0.5);
    }

    #[test]
    fn test_proportional_fallback_degenerate_source() {
        let metrics = uniform(3, 10.0);
        let source = PaneGeometry::new(0.0, 30.0, 200.0);
        let preview = PaneGeometry::new(0.0, 3000.0, 500.0);
        let mapper = ScrollMapper::new(&metrics, &[], source, preview);
        assert_eq!(mapper.source_to_preview(0.0), 0.0);
        assert_eq!(mapper.source_to_preview(25.0), 0.0);
    }

    #[test]
    fn test_degenerate_target_receives_zero() {
        let metrics = uniform(100, 10.0);
        let ranges = round_trip_ranges();
        let source = PaneGeometry::new(0.0, 1000.0, 200.0);
        let preview = PaneGeometry::new(0.0, 100.0, 400.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);
        assert_eq!(mapper.source_to_preview(500.0), 0.0);
        assert_eq!(mapper.source_to_preview(800.0), 0.0);
    }

    #[test]
    fn test_boundary_pinning_both_directions() {
        let metrics = uniform(100, 10.0);
        let ranges = round_trip_ranges();
        let source = PaneGeometry::new(0.0, 1000.0, 200.0);
        let preview = PaneGeometry::new(0.0, 2400.0, 300.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        let bottom = mapper.forward(800.0);
        assert_eq!(bottom.rule, MappingRule::PinnedBottom);
        assert_eq!(bottom.offset, 2100.0);
        assert_eq!(mapper.preview_to_source(2100.0), 800.0);

        assert_eq!(mapper.source_to_preview(0.0), 0.0);
        assert_eq!(mapper.preview_to_source(0.0), 0.0);
    }

    #[test]
    fn test_within_block_interpolation() {
        let metrics = uniform(10, 10.0);
        let ranges = [BlockRange::new(1, 10, 0.0, 200.0)];
        let source = PaneGeometry::new(0.0, 100.0, 50.0);
        let preview = PaneGeometry::new(0.0, 400.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        // line 5.0 is four of the block's nine line increments in
        let mapped = mapper.forward(40.0);
        assert_eq!(mapped.rule, MappingRule::WithinBlock);
        approx(mapped.offset, 4.0 / 9.0 * 200.0, 1e-6);

        let back = mapper.inverse(mapped.offset);
        assert_eq!(back.rule, MappingRule::WithinBlock);
        approx(back.offset, 40.0, 1e-6);
    }

    #[test]
    fn test_gap_interpolation() {
        let metrics = uniform(5, 10.0);
        let ranges = [
            BlockRange::new(1, 2, 0.0, 40.0),
            BlockRange::new(4, 5, 60.0, 100.0),
        ];
        let source = PaneGeometry::new(0.0, 50.0, 10.0);
        let preview = PaneGeometry::new(0.0, 300.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        // offset 20 is line 3.0, the unannotated line between the blocks
        let mapped = mapper.forward(20.0);
        assert_eq!(mapped.rule, MappingRule::Gap);
        approx(mapped.offset, 50.0, 1e-6);

        let back = mapper.inverse(50.0);
        assert_eq!(back.rule, MappingRule::Gap);
        approx(back.offset, 20.0, 1e-6);
    }

    #[test]
    fn test_before_first_block() {
        let metrics = uniform(20, 10.0);
        let ranges = [BlockRange::new(3, 8, 30.0, 90.0)];
        let source = PaneGeometry::new(0.0, 200.0, 50.0);
        let preview = PaneGeometry::new(0.0, 400.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview).with_pin_edges(false);

        let mapped = mapper.forward(5.0);
        assert_eq!(mapped.rule, MappingRule::BeforeFirst);
        assert_eq!(mapped.offset, 30.0);

        let back = mapper.inverse(10.0);
        assert_eq!(back.rule, MappingRule::BeforeFirst);
        assert_eq!(back.offset, 20.0);
    }

    #[test]
    fn test_past_last_block() {
        let metrics = uniform(20, 10.0);
        let ranges = [BlockRange::new(1, 8, 0.0, 90.0)];
        let source = PaneGeometry::new(0.0, 200.0, 50.0);
        let preview = PaneGeometry::new(0.0, 400.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview).with_pin_edges(false);

        let mapped = mapper.forward(100.0);
        assert_eq!(mapped.rule, MappingRule::PastLast);
        assert_eq!(mapped.offset, 300.0);

        let back = mapper.inverse(200.0);
        assert_eq!(back.rule, MappingRule::PastLast);
        assert_eq!(back.offset, 70.0);
    }

    #[test]
    fn test_source_padding_is_respected() {
        let metrics = uniform(10, 10.0);
        let ranges = [BlockRange::new(1, 10, 0.0, 200.0)];
        let source = PaneGeometry::new(0.0, 120.0, 50.0).with_padding_top(10.0);
        let preview = PaneGeometry::new(0.0, 400.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);
        let mapped = mapper.source_to_preview(50.0);
        approx(mapped, 4.0 / 9.0 * 200.0, 1e-6);
        approx(mapper.preview_to_source(mapped), 50.0, 1e-6);
    }

    #[test]
    fn test_forward_is_monotonic() {
        let metrics = uniform(100, 10.0);
        let ranges = round_trip_ranges();
        let source = PaneGeometry::new(0.0, 1000.0, 200.0);
        let preview = PaneGeometry::new(0.0, 2000.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        let mut previous = f64::NEG_INFINITY;
        for step in 0..=160 {
            let mapped = mapper.source_to_preview(f64::from(step) * 5.0);
            assert!(mapped >= previous, "forward went backwards at step {step}");
            previous = mapped;
        }
    }

    #[test]
    fn test_round_trip_within_one_line() {
        let metrics = uniform(100, 10.0);
        let ranges = round_trip_ranges();
        let source = PaneGeometry::new(0.0, 1000.0, 200.0);
        let preview = PaneGeometry::new(0.0, 2000.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        for step in 0..=800 {
            let x = f64::from(step);
            let back = mapper.preview_to_source(mapper.source_to_preview(x));
            approx(back, x, 10.0);
        }
    }

    #[test]
    fn test_round_trip_with_wrapped_lines() {
        let heights: Vec<f64> = (0..60)
            .map(|i| if i % 7 == 0 { 30.0 } else { 10.0 })
            .collect();
        let metrics = LineMetrics::from_heights(heights, MetricsSource::Measured);
        let ranges = vec![
            BlockRange::new(1, 1, 0.0, 40.0),
            BlockRange::new(3, 12, 60.0, 300.0),
            BlockRange::new(14, 14, 330.0, 360.0),
            BlockRange::new(16, 60, 390.0, 1800.0),
        ];
        let content = metrics.content_height();
        let source = PaneGeometry::new(0.0, content, 150.0);
        let preview = PaneGeometry::new(0.0, 1800.0, 150.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        let max = source.scrollable_range() as u32;
        for x in 0..=max {
            let x = f64::from(x);
            let back = mapper.preview_to_source(mapper.source_to_preview(x));
            let line = metrics.line_at_offset(x);
            approx(back, x, metrics.height(line).max(10.0));
        }
    }

    #[test]
    fn test_bracket_ties_prefer_containing_range() {
        let ranges = [
            BlockRange::new(2, 2, 10.0, 20.0),
            BlockRange::new(2, 4, 20.0, 60.0),
            BlockRange::new(6, 6, 80.0, 90.0),
        ];
        let by_line = |value: f64| {
            bracket(
                &ranges,
                value,
                |r| r.start_line as f64,
                |r| r.contains_line(value),
            )
        };
        assert_eq!(by_line(2.0), (0, 0));
        assert_eq!(by_line(3.0), (1, 2));
        assert_eq!(by_line(5.0), (1, 2));
        assert_eq!(by_line(0.5), (0, 0));
        assert_eq!(by_line(9.0), (2, 2));
    }

    #[test]
    fn test_shared_start_line_maps_into_containing_block() {
        let metrics = uniform(10, 10.0);
        let ranges = [
            BlockRange::new(2, 2, 10.0, 20.0),
            BlockRange::new(2, 4, 20.0, 60.0),
            BlockRange::new(6, 8, 80.0, 140.0),
        ];
        let source = PaneGeometry::new(0.0, 100.0, 20.0);
        let preview = PaneGeometry::new(0.0, 300.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        // line 3.0 sits inside the 2-4 block, halfway through its span
        let mapped = mapper.forward(20.0);
        assert_eq!(mapped.rule, MappingRule::WithinBlock);
        approx(mapped.offset, 40.0, 1e-6);
    }
    #[test]
    fn test_inverse_searches_blocks_in_pixel_order() {
        let metrics = uniform(10, 10.0);
        let ranges = [
            BlockRange::new(1, 4, 100.0, 200.0),
            BlockRange::new(6, 9, 0.0, 80.0),
        ];
        let source = PaneGeometry::new(0.0, 100.0, 50.0);
        let preview = PaneGeometry::new(0.0, 1000.0, 100.0);
        let mapper = ScrollMapper::new(&metrics, &ranges, source, preview);

        let mapped = mapper.inverse(150.0);
        assert_eq!(mapped.rule, MappingRule::WithinBlock);
        approx(mapped.offset, 15.0, 1e-9);

        let past = mapper.inverse(250.0);
        assert_eq!(past.rule, MappingRule::PastLast);
        approx(past.offset, 30.0, 1e-9);
    }
}

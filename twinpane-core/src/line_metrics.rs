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

//! Per-line pixel metrics of the buffer pane.
//!
//! [`LineMetrics`] is the table of line tops and heights for one
//! `(content, width)` pair. [`LineMetricsBuilder`] produces it through a
//! [`TextLayoutMeasure`] service and caches the last result.

use ropey::Rope;
use std::sync::Arc;

use crate::buffer::SourceBuffer;
use crate::measure::{FontMetrics, MeasureError, TextLayoutMeasure, PLACEHOLDER_GLYPH};

/// How a [`LineMetrics`] table was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsSource {
    /// Heights came from the measurement service
    Measured,
    /// Measurement failed; every line got the pane's line height
    Estimated,
}

/// Line tops and heights, 1-indexed.
///
/// `tops` has one extra trailing entry, the content height, so that
/// `top(n + 1)` is defined and `top(i + 1) == top(i) + height(i)` holds for
/// every line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMetrics {
    tops: Vec<f64>,
    heights: Vec<f64>,
    source: MetricsSource,
}

impl LineMetrics {
    /// Build the table from per-line heights, accumulating tops
    pub fn from_heights(heights: Vec<f64>, source: MetricsSource) -> Self {
        let mut tops = Vec::with_capacity(heights.len() + 1);
        let mut running = 0.0;
        for height in &heights {
            tops.push(running);
            running += height;
        }
        tops.push(running);
        Self {
            tops,
            heights,
            source,
        }
    }

    pub fn uniform(line_count: usize, line_height: f64, source: MetricsSource) -> Self {
        Self::from_heights(vec![line_height; line_count], source)
    }

    pub fn line_count(&self) -> usize {
        self.heights.len()
    }

    pub fn source(&self) -> MetricsSource {
        self.source
    }

    pub fn content_height(&self) -> f64 {
        self.tops.last().copied().unwrap_or(0.0)
    }

    /// Top of `line` (1-based). `line_count() + 1` is the content height.
    /// Out-of-range lines clamp to the nearest end.
    pub fn top(&self, line: usize) -> f64 {
        let index = line.clamp(1, self.tops.len()) - 1;
        self.tops[index]
    }

    /// Height of `line` (1-based); zero past the last line
    pub fn height(&self, line: usize) -> f64 {
        if line == 0 {
            return self.heights.first().copied().unwrap_or(0.0);
        }
        self.heights.get(line - 1).copied().unwrap_or(0.0)
    }

    /// Line containing `offset`: the last line whose top is `<= offset`.
    /// An offset exactly on a top shared by several lines resolves to the
    /// earliest of them; past that top only the last one has any extent.
    pub fn line_at_offset(&self, offset: f64) -> usize {
        let line_tops = &self.tops[..self.heights.len()];
        let past = line_tops.partition_point(|top| *top <= offset);
        if past == 0 {
            return 1;
        }
        let found = line_tops[past - 1];
        if offset > found {
            return past;
        }
        line_tops.partition_point(|top| *top < found) + 1
    }

    /// Fractional line position of a scroll offset
    pub fn line_float_at(&self, offset: f64) -> f64 {
        if self.heights.is_empty() {
            return 1.0;
        }
        let line = self.line_at_offset(offset);
        let height = self.height(line);
        let progress = if height > 0.0 {
            ((offset - self.top(line)) / height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        line as f64 + progress
    }

    /// Scroll offset of a fractional line position
    pub fn offset_of(&self, line_float: f64) -> f64 {
        let upper = (self.line_count() + 1) as f64;
        let clamped = if line_float.is_finite() {
            line_float.clamp(1.0, upper)
        } else {
            1.0
        };
        let base = clamped.floor();
        let frac = clamped - base;
        let base = base as usize;
        self.top(base) + frac * self.height(base)
    }
}

struct CacheEntry {
    content: Rope,
    width_bits: u64,
    metrics: Arc<LineMetrics>,
}

/// Builds [`LineMetrics`] for the buffer pane and caches the last build.
///
/// The cache is keyed by content and render width. A hit hands back the same
/// `Arc`; a miss replaces the entry.
pub struct LineMetricsBuilder<M> {
    measure: M,
    font: FontMetrics,
    cache: Option<CacheEntry>,
}

impl<M: TextLayoutMeasure> LineMetricsBuilder<M> {
    pub fn new(measure: M, font: FontMetrics) -> Self {
        Self {
            measure,
            font,
            cache: None,
        }
    }

    pub fn measure_mut(&mut self) -> &mut M {
        &mut self.measure
    }

    pub fn build(&mut self, buffer: &SourceBuffer, width: f64) -> Arc<LineMetrics> {
        let width_bits = width.to_bits();
        if let Some(entry) = &self.cache {
            if entry.width_bits == width_bits && buffer.same_content(&entry.content) {
                return Arc::clone(&entry.metrics);
            }
        }

        let metrics = Arc::new(self.compute(buffer, width));
        self.cache = Some(CacheEntry {
            content: buffer.rope().clone(),
            width_bits,
            metrics: Arc::clone(&metrics),
        });
        metrics
    }

    fn compute(&mut self, buffer: &SourceBuffer, width: f64) -> LineMetrics {
        let lines: Vec<String> = buffer.lines().collect();
        let to_measure: Vec<&str> = lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    PLACEHOLDER_GLYPH
                } else {
                    line.as_str()
                }
            })
            .collect();

        let fallback_height = self.fallback_line_height();
        let measured = self
            .measure
            .measure(&to_measure, width, &self.font)
            .and_then(|heights| {
                if heights.len() == lines.len() {
                    Ok(heights)
                } else {
                    Err(MeasureError::LengthMismatch {
                        expected: lines.len(),
                        got: heights.len(),
                    })
                }
            });

        match measured {
            Ok(heights) => {
                let heights = heights
                    .into_iter()
                    .map(|h| {
                        if h.is_finite() && h > 0.0 {
                            h
                        } else {
                            fallback_height
                        }
                    })
                    .collect();
                tracing::debug!(lines = lines.len(), width, "measured line metrics");
                LineMetrics::from_heights(heights, MetricsSource::Measured)
            }
            Err(error) => {
                tracing::warn!(%error, "falling back to uniform line height");
                LineMetrics::uniform(lines.len(), fallback_height, MetricsSource::Estimated)
            }
        }
    }

    fn fallback_line_height(&self) -> f64 {
        if self.font.line_height.is_finite() && self.font.line_height > 0.0 {
            self.font.line_height
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{NoSurface, UniformMeasure};

    /// Wraps at `width` characters, 10 units per visual row; counts calls.
    struct CharWrap {
        calls: usize,
        seen_empty: bool,
    }

    impl TextLayoutMeasure for CharWrap {
        fn measure(
            &mut self,
            lines: &[&str],
            width: f64,
            _font: &FontMetrics,
        ) -> Result<Vec<f64>, MeasureError> {
            self.calls += 1;
            let cols = width.max(1.0) as usize;
            Ok(lines
                .iter()
                .map(|line| {
                    self.seen_empty |= line.is_empty();
                    let chars = line.chars().count().max(1);
                    (chars.div_ceil(cols) * 10) as f64
                })
                .collect())
        }
    }

    fn char_wrap() -> CharWrap {
        CharWrap {
            calls: 0,
            seen_empty: false,
        }
    }

    fn font() -> FontMetrics {
        FontMetrics::with_line_height(10.0)
    }

    fn assert_monotonic(metrics: &LineMetrics) {
        for line in 1..=metrics.line_count() {
            assert!(metrics.top(line + 1) >= metrics.top(line));
            assert!(
                (metrics.top(line) + metrics.height(line) - metrics.top(line + 1)).abs() < 1e-9,
                "line {line} does not abut the next"
            );
        }
    }

    #[test]
    fn test_tops_accumulate_wrapped_heights() {
        let buffer = SourceBuffer::from_text("short\nthis line wraps twice\n\nend");
        let mut builder = LineMetricsBuilder::new(char_wrap(), font());
        let metrics = builder.build(&buffer, 8.0);

        assert_eq!(metrics.line_count(), 4);
        assert_eq!(metrics.height(1), 10.0);
        assert_eq!(metrics.height(2), 30.0);
        assert_eq!(metrics.height(3), 10.0);
        assert_eq!(metrics.top(4), 50.0);
        assert_eq!(metrics.content_height(), 60.0);
        assert_eq!(metrics.source(), MetricsSource::Measured);
        assert_monotonic(&metrics);
    }

    #[test]
    fn test_monotonic_for_assorted_buffers() {
        let texts = [
            "",
            "\n\n\n",
            "one line",
            "a\nbb\nccc dddd eeeee ffffff ggggggg\n\n\nh",
            "# Heading\n\n- item\n- item two is longer than the width\n\n```\ncode\n```\n",
        ];
        for text in texts {
            let mut builder = LineMetricsBuilder::new(char_wrap(), font());
            let metrics = builder.build(&SourceBuffer::from_text(text), 6.0);
            assert_monotonic(&metrics);
        }
    }

    #[test]
    fn test_empty_lines_use_placeholder() {
        let buffer = SourceBuffer::from_text("a\n\nb");
        let mut builder = LineMetricsBuilder::new(char_wrap(), font());
        let metrics = builder.build(&buffer, 80.0);
        assert!(!builder.measure_mut().seen_empty);
        assert_eq!(metrics.height(2), 10.0);
    }

    #[test]
    fn test_cache_hit_returns_same_table() {
        let buffer = SourceBuffer::from_text("a\nb\nc");
        let mut builder = LineMetricsBuilder::new(char_wrap(), font());
        let first = builder.build(&buffer, 20.0);
        let second = builder.build(&buffer.clone(), 20.0);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.measure_mut().calls, 1);
    }

    #[test]
    fn test_cache_miss_on_content_or_width_change() {
        let buffer = SourceBuffer::from_text("a\nb\nc");
        let mut builder = LineMetricsBuilder::new(char_wrap(), font());
        let first = builder.build(&buffer, 20.0);
        let wider = builder.build(&buffer, 40.0);
        assert!(!Arc::ptr_eq(&first, &wider));

        let edited = SourceBuffer::from_text("a\nb\nc\nd");
        let grown = builder.build(&edited, 40.0);
        assert_eq!(grown.line_count(), 4);
        assert_eq!(builder.measure_mut().calls, 3);
        // The replaced table is left as it was
        assert_eq!(first.line_count(), 3);
    }

    #[test]
    fn test_unavailable_surface_falls_back_to_uniform() {
        let buffer = SourceBuffer::from_text("a\nbbbbbbbbbbbbbbbbbbbbbbbb\nc");
        let mut builder = LineMetricsBuilder::new(NoSurface, FontMetrics::with_line_height(18.0));
        let metrics = builder.build(&buffer, 4.0);
        assert_eq!(metrics.source(), MetricsSource::Estimated);
        assert_eq!(metrics.height(2), 18.0);
        assert_eq!(metrics.content_height(), 54.0);
    }

    #[test]
    fn test_length_mismatch_falls_back() {
        struct Short;
        impl TextLayoutMeasure for Short {
            fn measure(
                &mut self,
                _lines: &[&str],
                _width: f64,
                _font: &FontMetrics,
            ) -> Result<Vec<f64>, MeasureError> {
                Ok(vec![5.0])
            }
        }
        let mut builder = LineMetricsBuilder::new(Short, font());
        let metrics = builder.build(&SourceBuffer::from_text("a\nb"), 10.0);
        assert_eq!(metrics.source(), MetricsSource::Estimated);
        assert_eq!(metrics.line_count(), 2);
    }

    #[test]
    fn test_line_float_and_offset() {
        let metrics = LineMetrics::uniform(10, 10.0, MetricsSource::Measured);
        assert_eq!(metrics.line_float_at(0.0), 1.0);
        assert_eq!(metrics.line_float_at(40.0), 5.0);
        assert!((metrics.line_float_at(45.0) - 5.5).abs() < 1e-9);
        assert_eq!(metrics.line_float_at(-3.0), 1.0);
        // Past the end clamps to the end of the last line
        assert_eq!(metrics.line_float_at(500.0), 11.0);

        assert_eq!(metrics.offset_of(5.5), 45.0);
        assert_eq!(metrics.offset_of(0.2), 0.0);
        assert_eq!(metrics.offset_of(11.0), 100.0);
        assert_eq!(metrics.offset_of(40.0), 100.0);
        assert_eq!(metrics.offset_of(f64::NAN), 0.0);
    }

    #[test]
    fn test_line_search_prefers_earliest_tie() {
        let metrics =
            LineMetrics::from_heights(vec![10.0, 0.0, 0.0, 10.0], MetricsSource::Measured);
        assert_eq!(metrics.line_at_offset(10.0), 2);
        assert_eq!(metrics.line_at_offset(9.9), 1);
        assert_eq!(metrics.line_at_offset(15.0), 4);
    }

    #[test]
    fn test_offset_past_zero_height_line_lands_in_next_line() {
        let metrics = LineMetrics::from_heights(vec![10.0, 0.0, 10.0], MetricsSource::Measured);
        assert_eq!(metrics.line_float_at(10.0), 2.0);
        let line = metrics.line_float_at(15.0);
        assert!((line - 3.5).abs() < 1e-9);
        assert!((metrics.offset_of(line) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_measure_matches_estimate() {
        let buffer = SourceBuffer::from_text("x\ny");
        let mut builder = LineMetricsBuilder::new(UniformMeasure, font());
        let metrics = builder.build(&buffer, 100.0);
        assert_eq!(metrics.source(), MetricsSource::Measured);
        assert_eq!(metrics.content_height(), 20.0);
    }
}

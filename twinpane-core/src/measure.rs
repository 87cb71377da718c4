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

//! Text layout measurement service.
//!
//! The buffer pane's per-line heights depend on how the host wraps text at a
//! given width with a given font. Hosts plug that in through
//! [`TextLayoutMeasure`]; the mapping code never sees the host toolkit.

use thiserror::Error;

/// Glyph measured in place of an empty line so it keeps one line of height
pub const PLACEHOLDER_GLYPH: &str = "\u{a0}";

/// Font and box metrics of the buffer pane
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Font family, `None` for the host's default monospace
    pub family: Option<String>,
    pub size: f64,
    /// Computed line height of the pane, in the pane's units
    pub line_height: f64,
}

impl FontMetrics {
    pub fn with_line_height(line_height: f64) -> Self {
        Self {
            family: None,
            size: line_height,
            line_height,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    #[error("measurement surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("measured {got} heights for {expected} lines")]
    LengthMismatch { expected: usize, got: usize },
}

/// Measures the rendered height of each line when wrapped at `width`.
///
/// Implementations get one entry per line and must return one height per line.
/// Lines are never empty: callers substitute [`PLACEHOLDER_GLYPH`] first.
pub trait TextLayoutMeasure {
    fn measure(
        &mut self,
        lines: &[&str],
        width: f64,
        font: &FontMetrics,
    ) -> Result<Vec<f64>, MeasureError>;
}

impl<M: TextLayoutMeasure + ?Sized> TextLayoutMeasure for Box<M> {
    fn measure(
        &mut self,
        lines: &[&str],
        width: f64,
        font: &FontMetrics,
    ) -> Result<Vec<f64>, MeasureError> {
        (**self).measure(lines, width, font)
    }
}

/// Every line is exactly one line-height tall (no wrapping)
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMeasure;

impl TextLayoutMeasure for UniformMeasure {
    fn measure(
        &mut self,
        lines: &[&str],
        _width: f64,
        font: &FontMetrics,
    ) -> Result<Vec<f64>, MeasureError> {
        Ok(vec![font.line_height; lines.len()])
    }
}

/// A measurement service that is never available, for hosts without a layout
/// surface. The metrics builder always falls back to its uniform estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSurface;

impl TextLayoutMeasure for NoSurface {
    fn measure(
        &mut self,
        _lines: &[&str],
        _width: f64,
        _font: &FontMetrics,
    ) -> Result<Vec<f64>, MeasureError> {
        Err(MeasureError::SurfaceUnavailable(
            "no layout surface".to_string(),
        ))
    }
}

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

//! Word wrapping on a character-cell grid.
//!
//! The source pane draws its lines with [`wrap_line`] and measures them with
//! [`CellMeasure`], which uses the very same function, so measured heights
//! always match the rows on screen.

use twinpane_core::{FontMetrics, MeasureError, TextLayoutMeasure};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const TAB_WIDTH: usize = 4;

/// Measures lines in terminal rows. The font's line height is one row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMeasure;

impl TextLayoutMeasure for CellMeasure {
    fn measure(
        &mut self,
        lines: &[&str],
        width: f64,
        font: &FontMetrics,
    ) -> Result<Vec<f64>, MeasureError> {
        if !width.is_finite() || width < 1.0 {
            return Err(MeasureError::SurfaceUnavailable(format!(
                "pane is {width} columns wide"
            )));
        }
        let columns = width as usize;
        Ok(lines
            .iter()
            .map(|line| wrap_line(line, columns).len() as f64 * font.line_height)
            .collect())
    }
}

/// Font metrics of a terminal pane: one row per line
pub fn cell_font() -> FontMetrics {
    FontMetrics::with_line_height(1.0)
}

/// Wrap `text` into rows no wider than `width` columns.
///
/// Breaks at whitespace where possible; whitespace at a break is dropped.
/// Words wider than a row are split at character boundaries. Always returns at
/// least one row.
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let text = text.replace('\t', &" ".repeat(TAB_WIDTH));
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for token in tokens(&text) {
        let token_width = UnicodeWidthStr::width(token);
        if current_width + token_width <= width {
            current.push_str(token);
            current_width += token_width;
            continue;
        }

        if token.starts_with(char::is_whitespace) {
            push_row(&mut rows, &mut current);
            current_width = 0;
            continue;
        }

        if !current.is_empty() {
            push_row(&mut rows, &mut current);
            current_width = 0;
        }

        if token_width <= width {
            current.push_str(token);
            current_width = token_width;
            continue;
        }

        for ch in token.chars() {
            let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if current_width + ch_width > width && !current.is_empty() {
                rows.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Finish the current row, dropping whitespace left hanging at the break
fn push_row(rows: &mut Vec<String>, current: &mut String) {
    let row = std::mem::take(current);
    rows.push(row.trim_end().to_string());
}

/// Split into alternating runs of whitespace and non-whitespace
fn tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (index, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(previous) if previous != space => {
                tokens.push(&text[start..index]);
                start = index;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

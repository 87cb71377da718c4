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

//! The source buffer: an immutable, 1-indexed line snapshot of the document.

use ropey::Rope;

/// Snapshot of the buffer pane's text.
///
/// Snapshots are never edited in place; an edit produces a new snapshot via
/// [`SourceBuffer::replace`]. Cloning is cheap (the rope shares its nodes).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBuffer {
    rope: Rope,
}

impl SourceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Replace the whole snapshot with new text
    pub fn replace(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Number of lines. A trailing newline opens one more (empty) line, and an
    /// empty buffer still has one line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line `line` (1-based) without its line terminator
    pub fn line(&self, line: usize) -> Option<String> {
        if line == 0 || line > self.line_count() {
            return None;
        }
        let text = self.rope.line(line - 1).to_string();
        Some(strip_line_ending(&text).to_string())
    }

    /// All lines in order, without terminators
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rope
            .lines()
            .map(|slice| strip_line_ending(&slice.to_string()).to_string())
    }

    /// Whether this snapshot has exactly the given content
    pub fn same_content(&self, other: &Rope) -> bool {
        self.rope == *other
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

impl From<&str> for SourceBuffer {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

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

//! The rendered preview: markdown blocks laid out on a row grid.
//!
//! Parsing is delegated to pulldown-cmark. Each top-level block keeps the
//! source line span its byte range covers; list items carry their own spans
//! under an unannotated list container. Layout wraps block text at the pane
//! width and stacks blocks with a configurable gap.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::ops::Range;
use twinpane_core::config::PreviewConfig;
use twinpane_core::{RenderedNode, SourceBuffer};

use crate::cell_measure::wrap_line;

pub const RULE_GLYPH: &str = "─";
pub const BULLET: &str = "• ";
pub const QUOTE_BAR: &str = "│ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading(u8),
    Paragraph,
    List,
    ListItem,
    Code,
    Quote,
    Table,
    Rule,
    Html,
}

/// One rendered block and the source lines it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewBlock {
    pub kind: BlockKind,
    /// Inclusive 1-based source line span; `None` for containers
    pub lines: Option<(usize, usize)>,
    /// Logical text lines before wrapping
    pub text: Vec<String>,
    pub children: Vec<PreviewBlock>,
}

impl PreviewBlock {
    fn new(kind: BlockKind, lines: Option<(usize, usize)>) -> Self {
        Self {
            kind,
            lines,
            text: vec![String::new()],
            children: Vec::new(),
        }
    }

    fn push_str(&mut self, s: &str) {
        if let Some(last) = self.text.last_mut() {
            last.push_str(s);
        }
    }

    fn new_line(&mut self) {
        self.text.push(String::new());
    }

    /// Drop empty trailing lines left by block-level breaks
    fn finish(&mut self) {
        while self.text.len() > 1 && self.text.last().is_some_and(|l| l.trim().is_empty()) {
            self.text.pop();
        }
    }
}

/// Parse source text into preview blocks.
pub fn parse_blocks(source: &SourceBuffer) -> Vec<PreviewBlock> {
    let text = source.text();
    let rope = source.rope();
    let line_span = |range: &Range<usize>| {
        let start_byte = range.start.min(text.len());
        let end_byte = range.end.min(text.len()).max(start_byte);
        // Trailing blank lines belong to the gap, not the block
        let trimmed = text[start_byte..end_byte].trim_end().len();
        let last_byte = (start_byte + trimmed).saturating_sub(1).max(start_byte);
        let start = rope.byte_to_line(start_byte) + 1;
        let end = rope.byte_to_line(last_byte.min(text.len())) + 1;
        (start, end.max(start))
    };

    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut blocks: Vec<PreviewBlock> = Vec::new();
    let mut current: Option<PreviewBlock> = None;
    let mut item: Option<PreviewBlock> = None;
    let mut depth = 0usize;
    let mut nested_lists = 0usize;

    for (event, range) in Parser::new_ext(&text, options).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                depth += 1;
                if depth == 1 {
                    let lines = Some(line_span(&range));
                    current = Some(match tag {
                        Tag::Heading { level, .. } => {
                            PreviewBlock::new(BlockKind::Heading(level as u8), lines)
                        }
                        Tag::List(_) => PreviewBlock::new(BlockKind::List, None),
                        Tag::CodeBlock(_) => PreviewBlock::new(BlockKind::Code, lines),
                        Tag::BlockQuote(_) => PreviewBlock::new(BlockKind::Quote, lines),
                        Tag::Table(_) => PreviewBlock::new(BlockKind::Table, lines),
                        Tag::HtmlBlock => PreviewBlock::new(BlockKind::Html, lines),
                        _ => PreviewBlock::new(BlockKind::Paragraph, lines),
                    });
                    continue;
                }

                match tag {
                    Tag::Item if depth == 2 => {
                        let mut list_item =
                            PreviewBlock::new(BlockKind::ListItem, Some(line_span(&range)));
                        list_item.push_str(BULLET);
                        item = Some(list_item);
                    }
                    Tag::List(_) => nested_lists += 1,
                    Tag::Item => {
                        if let Some(target) = item.as_mut().or(current.as_mut()) {
                            target.new_line();
                            target.push_str(&"  ".repeat(nested_lists));
                            target.push_str(BULLET);
                        }
                    }
                    Tag::Paragraph | Tag::Heading { .. } | Tag::CodeBlock(_) => {
                        if let Some(target) = item.as_mut().or(current.as_mut()) {
                            if target.text.last().is_some_and(|l| !l.trim().is_empty())
                                && target.kind != BlockKind::ListItem
                            {
                                target.new_line();
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::End(tag_end) => {
                depth = depth.saturating_sub(1);
                match tag_end {
                    TagEnd::Item if depth == 1 => {
                        if let (Some(mut list_item), Some(list)) = (item.take(), current.as_mut()) {
                            list_item.finish();
                            list.children.push(list_item);
                        }
                    }
                    TagEnd::List(_) if depth > 0 => nested_lists = nested_lists.saturating_sub(1),
                    TagEnd::TableCell => {
                        if let Some(table) = current.as_mut() {
                            table.push_str(" │ ");
                        }
                    }
                    TagEnd::TableHead | TagEnd::TableRow => {
                        if let Some(table) = current.as_mut() {
                            if let Some(last) = table.text.last_mut() {
                                let trimmed = last.trim_end_matches(" │ ").to_string();
                                *last = trimmed;
                            }
                            table.new_line();
                        }
                    }
                    TagEnd::Paragraph if depth > 0 => {
                        if let Some(target) = item.as_mut().or(current.as_mut()) {
                            target.new_line();
                        }
                    }
                    _ => {}
                }
                if depth == 0 {
                    if let Some(mut block) = current.take() {
                        block.finish();
                        if block.kind == BlockKind::Quote {
                            for line in &mut block.text {
                                line.insert_str(0, QUOTE_BAR);
                            }
                        }
                        blocks.push(block);
                    }
                }
            }
            Event::Text(s) | Event::Code(s) | Event::Html(s) | Event::InlineHtml(s) => {
                let Some(target) = item.as_mut().or(current.as_mut()) else {
                    continue;
                };
                let mut parts = s.split('\n').peekable();
                while let Some(part) = parts.next() {
                    target.push_str(part);
                    if parts.peek().is_some() {
                        target.new_line();
                    }
                }
            }
            Event::SoftBreak => {
                if let Some(target) = item.as_mut().or(current.as_mut()) {
                    target.push_str(" ");
                }
            }
            Event::HardBreak => {
                if let Some(target) = item.as_mut().or(current.as_mut()) {
                    target.new_line();
                }
            }
            Event::TaskListMarker(done) => {
                if let Some(target) = item.as_mut().or(current.as_mut()) {
                    target.push_str(if done { "[x] " } else { "[ ] " });
                }
            }
            Event::Rule if depth == 0 => {
                let mut rule = PreviewBlock::new(BlockKind::Rule, Some(line_span(&range)));
                rule.push_str(RULE_GLYPH);
                blocks.push(rule);
            }
            _ => {}
        }
    }

    blocks
}

/// A row of the laid-out preview
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub text: String,
    /// Kind of the block the row belongs to; `None` for padding and gaps
    pub kind: Option<BlockKind>,
}

/// A block's position in the laid-out preview, in content rows
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub lines: Option<(usize, usize)>,
    pub top: usize,
    pub bottom: usize,
    pub children: Vec<PlacedBlock>,
}

/// Preview blocks wrapped to a width and stacked into rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewLayout {
    pub rows: Vec<PreviewRow>,
    pub placed: Vec<PlacedBlock>,
    pub padding_top: usize,
}

impl PreviewLayout {
    pub fn build(blocks: &[PreviewBlock], width: usize, config: &PreviewConfig) -> Self {
        let padding_top = usize::from(config.padding_top);
        let gap = usize::from(config.block_gap);
        let mut layout = Self {
            rows: vec![
                PreviewRow {
                    text: String::new(),
                    kind: None,
                };
                padding_top
            ],
            placed: Vec::new(),
            padding_top,
        };

        for (index, block) in blocks.iter().enumerate() {
            if index > 0 {
                layout.push_blank(gap);
            }
            let placed = layout.place(block, width);
            layout.placed.push(placed);
        }
        layout
    }

    /// Total content height in rows, padding included
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    fn push_blank(&mut self, count: usize) {
        for _ in 0..count {
            self.rows.push(PreviewRow {
                text: String::new(),
                kind: None,
            });
        }
    }

    fn place(&mut self, block: &PreviewBlock, width: usize) -> PlacedBlock {
        let top = self.rows.len();
        let mut children = Vec::new();

        if block.children.is_empty() {
            for line in &block.text {
                let line = if block.kind == BlockKind::Rule {
                    RULE_GLYPH.repeat(width.max(1))
                } else {
                    line.clone()
                };
                for row in wrap_line(&line, width) {
                    self.rows.push(PreviewRow {
                        text: row,
                        kind: Some(block.kind),
                    });
                }
            }
        } else {
            for child in &block.children {
                children.push(self.place(child, width));
            }
        }

        PlacedBlock {
            lines: block.lines,
            top,
            bottom: self.rows.len(),
            children,
        }
    }

    /// The rendered tree as it sits on screen with the preview scrolled to
    /// `scroll_top` and its viewport starting at screen row `viewport_top`
    pub fn project(&self, scroll_top: usize, viewport_top: usize) -> Vec<RenderedNode> {
        let shift = viewport_top as f64 - scroll_top as f64;
        self.placed
            .iter()
            .map(|placed| project_one(placed, shift))
            .collect()
    }
}

fn project_one(placed: &PlacedBlock, shift: f64) -> RenderedNode {
    RenderedNode {
        lines: placed.lines.map(|(start, end)| (start as i64, end as i64)),
        screen_top: placed.top as f64 + shift,
        screen_bottom: placed.bottom as f64 + shift,
        children: placed
            .children
            .iter()
            .map(|child| project_one(child, shift))
            .collect(),
    }
}

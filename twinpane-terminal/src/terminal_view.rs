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

use crossterm::event::{
    Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::style::{Color, Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use futures::{future::FutureExt, select, StreamExt};
use std::io::Write;
use tokio::time::{interval, Duration};
use twinpane_core::{
    Clock, LockState, MappingRule, Pane, SyncCoordinator, SyncOutcome, SystemClock,
    TextLayoutMeasure,
};
use unicode_width::UnicodeWidthChar;

use crate::file_watcher::FileWatcher;
use crate::host::{SplitHost, SplitLayout, HEADER_HEIGHT};
use crate::preview::BlockKind;

pub const BG_COLOR: Color = Color::Black;
pub const FG_COLOR: Color = Color::White;
pub const HEADER_BG_COLOR: Color = Color::Blue;
pub const INACTIVE_HEADER_BG_COLOR: Color = Color::DarkGrey;
pub const SEPARATOR_COLOR: Color = Color::DarkGrey;
pub const HEADING_COLOR: Color = Color::Cyan;
pub const CODE_COLOR: Color = Color::Yellow;
pub const QUOTE_COLOR: Color = Color::Grey;
pub const LOCKED_COLOR: Color = Color::Red;
pub const SEPARATOR: &str = "│";
pub const EMPTY_ROW: &str = "~";

pub const GUTTER_BG_COLOR: Color = Color::Rgb {
    r: 20,
    g: 20,
    b: 20,
};
pub const GUTTER_FG_COLOR: Color = Color::DarkGrey;

/// Rows moved per mouse wheel notch
pub const WHEEL_ROWS: isize = 3;
/// How often the loop wakes without input to poll the file watcher
pub const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Scroll(isize),
    /// Whole pages, keeping one row of overlap
    Page(isize),
    Top,
    Bottom,
    SwitchPane,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => Action::Quit,
        (KeyCode::Char('q'), _) => Action::Quit,
        (KeyCode::Tab, _) | (KeyCode::BackTab, _) => Action::SwitchPane,
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Action::Scroll(1),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Action::Scroll(-1),
        (KeyCode::PageDown, _) | (KeyCode::Char(' '), _) => Action::Page(1),
        (KeyCode::PageUp, _) => Action::Page(-1),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Action::Top,
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Action::Bottom,
        _ => return None,
    };
    Some(action)
}

/// A viewing session: a split host, its sync coordinator and the focused pane
pub struct Viewer<M, C = SystemClock> {
    host: SplitHost,
    coordinator: SyncCoordinator<M, C>,
    focus: Pane,
    last_rule: Option<MappingRule>,
    title: String,
}

impl<M: TextLayoutMeasure, C: Clock> Viewer<M, C> {
    pub fn new(
        host: SplitHost,
        coordinator: SyncCoordinator<M, C>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            host,
            coordinator,
            focus: Pane::Source,
            last_rule: None,
            title: title.into(),
        }
    }

    pub fn host(&self) -> &SplitHost {
        &self.host
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn last_rule(&self) -> Option<MappingRule> {
        self.last_rule
    }

    pub fn lock_state(&mut self) -> LockState {
        self.coordinator.lock_state()
    }

    pub fn apply(&mut self, action: Action) -> Flow {
        let page = (self.host.layout().body_rows() as isize - 1).max(1);
        match action {
            Action::Quit => return Flow::Quit,
            Action::SwitchPane => self.focus = self.focus.other(),
            Action::Scroll(rows) => self.scroll(self.focus, rows),
            Action::Page(pages) => self.scroll(self.focus, pages * page),
            Action::Top => self.scroll_to(self.focus, 0),
            Action::Bottom => self.scroll_to(self.focus, self.host.max_scroll(self.focus)),
        }
        Flow::Continue
    }

    /// Wheel notches at screen column `x`; the pane under the pointer moves
    pub fn wheel(&mut self, x: u16, notches: isize) {
        if let Some(pane) = self.host.layout().pane_at(x) {
            self.scroll(pane, notches * WHEEL_ROWS);
        }
    }

    pub fn scroll(&mut self, pane: Pane, rows: isize) {
        if self.host.scroll_by(pane, rows) {
            self.scrolled(pane);
        }
    }

    pub fn scroll_to(&mut self, pane: Pane, top: usize) {
        if self.host.set_scroll(pane, top) {
            self.scrolled(pane);
        }
    }

    /// New terminal size; the unfocused pane follows the focused one again
    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.host.resize(SplitLayout::new(columns, rows));
        self.scrolled(self.focus);
    }

    /// New source text from disk
    pub fn reload(&mut self, text: &str) {
        self.host.reload(text);
        let lines = self.host.source_buffer().line_count();
        tracing::info!(lines, "source reloaded");
        self.scrolled(self.focus);
    }

    /// `pane` moved; report it and then every echo the sync write produced
    fn scrolled(&mut self, pane: Pane) {
        self.report(pane);
        for echo in self.host.drain_echoes() {
            self.report(echo);
        }
    }

    fn report(&mut self, pane: Pane) {
        match self.coordinator.on_scroll(pane, &mut self.host) {
            SyncOutcome::Applied {
                target,
                offset,
                rule,
            } => {
                tracing::debug!(?pane, ?target, offset, ?rule, "panes synced");
                self.last_rule = Some(rule);
            }
            SyncOutcome::Suppressed => {}
        }
    }

    pub fn status_line(&mut self) -> String {
        let lock = match self.lock_state() {
            LockState::Idle => "idle",
            LockState::Locked { .. } => "locked",
        };
        let rule = self
            .last_rule
            .map(|r| format!("{r:?}"))
            .unwrap_or_else(|| "-".to_string());
        format!(
            " {} | source {}/{} | preview {}/{} | sync {lock} | {rule}",
            match self.focus {
                Pane::Source => "SOURCE",
                Pane::Preview => "PREVIEW",
            },
            self.host.scroll_top(Pane::Source),
            self.host.max_scroll(Pane::Source),
            self.host.scroll_top(Pane::Preview),
            self.host.max_scroll(Pane::Preview),
        )
    }
}

/// Cut `text` to `width` columns and pad it with spaces to exactly that width
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

/// Draws a [`Viewer`] to a crossterm device
pub struct TerminalView<W: Write> {
    device: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(device: W) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &W {
        &self.device
    }

    pub fn render<M: TextLayoutMeasure, C: Clock>(
        &mut self,
        viewer: &mut Viewer<M, C>,
    ) -> Result<(), std::io::Error> {
        let status = viewer.status_line();
        let locked = matches!(viewer.lock_state(), LockState::Locked { .. });
        let host = viewer.host();
        let layout = host.layout();

        queue!(self.device, cursor::Hide)?;
        self.render_header(host, viewer.focus(), viewer.title())?;
        for row in 0..layout.body_rows() {
            let y = HEADER_HEIGHT + row;
            self.render_source_row(host, usize::from(row), y)?;
            queue!(
                self.device,
                cursor::MoveTo(layout.separator_column(), y),
                Print(SEPARATOR.with(SEPARATOR_COLOR).on(BG_COLOR))
            )?;
            self.render_preview_row(host, usize::from(row), y)?;
        }

        let status_color = if locked {
            LOCKED_COLOR
        } else {
            INACTIVE_HEADER_BG_COLOR
        };
        queue!(
            self.device,
            cursor::MoveTo(0, HEADER_HEIGHT + layout.body_rows()),
            Print(
                fit(&status, usize::from(layout.columns))
                    .with(FG_COLOR)
                    .on(status_color)
            )
        )?;
        self.device.flush()
    }

    fn render_header(
        &mut self,
        host: &SplitHost,
        focus: Pane,
        title: &str,
    ) -> Result<(), std::io::Error> {
        let layout = host.layout();
        let bg = |pane: Pane| {
            if pane == focus {
                HEADER_BG_COLOR
            } else {
                INACTIVE_HEADER_BG_COLOR
            }
        };
        let source_label = fit(&format!(" {title}"), usize::from(layout.source_columns()));
        let preview_label = fit(" preview", usize::from(layout.preview_columns()));
        queue!(
            self.device,
            cursor::MoveTo(0, 0),
            Clear(ClearType::CurrentLine),
            Print(source_label.with(FG_COLOR).on(bg(Pane::Source))),
            cursor::MoveTo(layout.separator_column(), 0),
            Print(SEPARATOR.with(SEPARATOR_COLOR).on(BG_COLOR)),
            cursor::MoveTo(layout.preview_column(), 0),
            Print(preview_label.with(FG_COLOR).on(bg(Pane::Preview)))
        )
    }

    fn render_source_row(
        &mut self,
        host: &SplitHost,
        row: usize,
        y: u16,
    ) -> Result<(), std::io::Error> {
        let gutter = usize::from(host.gutter_width());
        let text_columns = usize::from(host.source_text_columns());
        let number_width = gutter.saturating_sub(1);
        let index = host.scroll_top(Pane::Source) + row;

        let (number, text) = match host.source_rows().get(index) {
            Some(source_row) if source_row.first => {
                let number = format!("{:>number_width$} ", source_row.line);
                (number, source_row.text.as_str())
            }
            Some(source_row) => (" ".repeat(gutter), source_row.text.as_str()),
            None => (format!("{EMPTY_ROW:>number_width$} "), ""),
        };
        let number_columns = gutter.min(usize::from(host.layout().source_columns()));
        let number = fit(&number, number_columns);
        queue!(
            self.device,
            cursor::MoveTo(0, y),
            Print(number.with(GUTTER_FG_COLOR).on(GUTTER_BG_COLOR)),
            Print(fit(text, text_columns).with(FG_COLOR).on(BG_COLOR))
        )
    }

    fn render_preview_row(
        &mut self,
        host: &SplitHost,
        row: usize,
        y: u16,
    ) -> Result<(), std::io::Error> {
        let layout = host.layout();
        let index = host.scroll_top(Pane::Preview) + row;
        let (text, kind) = match host.preview_layout().rows.get(index) {
            Some(preview_row) => (preview_row.text.as_str(), preview_row.kind),
            None => ("", None),
        };
        let cell = fit(text, usize::from(layout.preview_columns()));
        let styled = match kind {
            Some(BlockKind::Heading(_)) => cell.with(HEADING_COLOR).on(BG_COLOR).bold(),
            Some(BlockKind::Code) => cell.with(CODE_COLOR).on(GUTTER_BG_COLOR),
            Some(BlockKind::Quote) | Some(BlockKind::Rule) => cell.with(QUOTE_COLOR).on(BG_COLOR),
            _ => cell.with(FG_COLOR).on(BG_COLOR),
        };
        queue!(
            self.device,
            cursor::MoveTo(layout.preview_column(), y),
            Print(styled)
        )
    }
}

/// Flow for one terminal event
pub fn handle_event<M: TextLayoutMeasure, C: Clock>(
    viewer: &mut Viewer<M, C>,
    event: Event,
) -> Flow {
    match event {
        Event::Key(key) => match key_action(&key) {
            Some(action) => viewer.apply(action),
            None => Flow::Continue,
        },
        Event::Mouse(MouseEvent { kind, column, .. }) => {
            match kind {
                MouseEventKind::ScrollDown => viewer.wheel(column, 1),
                MouseEventKind::ScrollUp => viewer.wheel(column, -1),
                _ => {}
            }
            Flow::Continue
        }
        Event::Resize(columns, rows) => {
            viewer.resize(columns, rows);
            Flow::Continue
        }
        _ => Flow::Continue,
    }
}

/// Drive the viewer from terminal input until the user quits
pub async fn event_loop<W: Write, M: TextLayoutMeasure>(
    view: &mut TerminalView<W>,
    viewer: &mut Viewer<M>,
    watcher: Option<&FileWatcher>,
) -> twinpane_core::Result<()> {
    let mut event_stream = EventStream::new();
    let mut tick = interval(TICK);
    view.render(viewer)?;

    loop {
        let event = select! {
            event = event_stream.next().fuse() => match event {
                Some(Ok(event)) => Some(event),
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            _ = tick.tick().fuse() => None,
        };

        if let Some(watcher) = watcher {
            if watcher.poll_changed() {
                match std::fs::read_to_string(watcher.path()) {
                    Ok(text) => viewer.reload(&text),
                    Err(e) => {
                        let path = watcher.path().display();
                        tracing::warn!(path = %path, "reload failed: {e}");
                    }
                }
            }
        }

        if let Some(event) = event {
            if handle_event(viewer, event) == Flow::Quit {
                return Ok(());
            }
        }
        view.render(viewer)?;
    }
}

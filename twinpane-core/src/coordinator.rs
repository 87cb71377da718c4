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

//! The sync coordinator: turns a scroll event on one pane into a scroll write
//! on the other.
//!
//! One coordinator belongs to one editing session. It owns that session's
//! line metrics cache and its [`SyncLock`]; nothing here is shared between
//! sessions.

use std::sync::Arc;

use crate::block_range::{extract_block_ranges, RenderedNode};
use crate::buffer::SourceBuffer;
use crate::config::SyncConfig;
use crate::geometry::{Pane, PaneGeometry};
use crate::line_metrics::{LineMetrics, LineMetricsBuilder};
use crate::mapping::{Mapped, MappingRule, ScrollMapper};
use crate::measure::{FontMetrics, TextLayoutMeasure};
use crate::sync_lock::{Clock, LockState, SyncLock, SystemClock};

/// What the coordinator needs from the host showing the two panes
pub trait PaneHost {
    /// Live scroll geometry of a pane
    fn geometry(&self, pane: Pane) -> PaneGeometry;

    /// Current snapshot of the source buffer
    fn source(&self) -> &SourceBuffer;

    /// Width the source pane wraps its text at
    fn source_width(&self) -> f64;

    /// The rendered block tree of the preview pane, positioned on screen
    fn block_tree(&self) -> &[RenderedNode];

    /// Screen position of the top of the preview pane's viewport
    fn preview_viewport_top(&self) -> f64;

    /// Scroll `pane` to `offset`
    fn write_scroll(&mut self, pane: Pane, offset: f64);
}

/// Result of handling one scroll event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// The other pane was scrolled
    Applied {
        target: Pane,
        offset: f64,
        rule: MappingRule,
    },
    /// The lock was armed; the event was taken as an echo and dropped
    Suppressed,
}

pub struct SyncCoordinator<M, C = SystemClock> {
    metrics: LineMetricsBuilder<M>,
    lock: SyncLock,
    clock: C,
    pin_edges: bool,
}

impl<M: TextLayoutMeasure> SyncCoordinator<M, SystemClock> {
    pub fn new(measure: M, font: FontMetrics, config: &SyncConfig) -> Self {
        Self::with_clock(measure, font, config, SystemClock)
    }
}

impl<M: TextLayoutMeasure, C: Clock> SyncCoordinator<M, C> {
    pub fn with_clock(measure: M, font: FontMetrics, config: &SyncConfig, clock: C) -> Self {
        Self {
            metrics: LineMetricsBuilder::new(measure, font),
            lock: SyncLock::new(config.lock_window()),
            clock,
            pin_edges: config.pin_edges,
        }
    }

    pub fn lock_state(&mut self) -> LockState {
        self.lock.poll(self.clock.now())
    }

    /// Line metrics of the host's current source snapshot
    pub fn line_metrics(&mut self, host: &impl PaneHost) -> Arc<LineMetrics> {
        self.metrics.build(host.source(), host.source_width())
    }

    /// Handle a scroll event that `pane` reported.
    ///
    /// While the lock is armed the event is dropped. Otherwise the other
    /// pane's offset is computed, the lock is armed, and the offset is written.
    pub fn on_scroll(&mut self, pane: Pane, host: &mut impl PaneHost) -> SyncOutcome {
        let now = self.clock.now();
        if self.lock.is_locked(now) {
            tracing::trace!(?pane, "scroll event during lock window dropped");
            return SyncOutcome::Suppressed;
        }

        let mapped = self.map(pane, host);
        let target = pane.other();
        self.lock.arm(now);
        host.write_scroll(target, mapped.offset);

        SyncOutcome::Applied {
            target,
            offset: mapped.offset,
            rule: mapped.rule,
        }
    }

    /// Offset the other pane should get for `pane`'s current scroll position.
    /// Touches neither the lock nor the host.
    pub fn map(&mut self, pane: Pane, host: &impl PaneHost) -> Mapped {
        let metrics = self.line_metrics(host);
        let source = host.geometry(Pane::Source);
        let preview = host.geometry(Pane::Preview);
        let ranges = extract_block_ranges(host.block_tree(), host.preview_viewport_top(), &preview);
        let mapper =
            ScrollMapper::new(&metrics, &ranges, source, preview).with_pin_edges(self.pin_edges);

        match pane {
            Pane::Source => mapper.forward(source.scroll_top),
            Pane::Preview => mapper.inverse(preview.scroll_top),
        }
    }
}

impl<M, C> Drop for SyncCoordinator<M, C> {
    fn drop(&mut self) {
        tracing::debug!("sync session closed");
    }
}

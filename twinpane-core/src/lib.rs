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

//! Scroll synchronization between a source text pane and its rendered preview.

pub mod block_range;
pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geometry;
pub mod line_metrics;
pub mod mapping;
pub mod measure;
pub mod sync_lock;

pub use block_range::{extract_block_ranges, BlockRange, RenderedNode};
pub use buffer::SourceBuffer;
pub use config::Config;
pub use coordinator::{PaneHost, SyncCoordinator, SyncOutcome};
pub use error::{Error, Result};
pub use geometry::{Pane, PaneGeometry};
pub use line_metrics::{LineMetrics, LineMetricsBuilder, MetricsSource};
pub use mapping::{Mapped, MappingRule, ScrollMapper};
pub use measure::{FontMetrics, MeasureError, TextLayoutMeasure};
pub use sync_lock::{Clock, LockState, ManualClock, SyncLock, SystemClock};

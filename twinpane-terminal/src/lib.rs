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

//! Terminal host: a crossterm split screen with the markdown source on the
//! left and its rendered preview on the right, kept in step by a
//! [`twinpane_core::SyncCoordinator`].

pub mod cell_measure;
pub mod file_watcher;
pub mod host;
pub mod preview;
pub mod terminal_view;

pub use cell_measure::{cell_font, CellMeasure};
pub use file_watcher::FileWatcher;
pub use host::{SplitHost, SplitLayout, HEADER_HEIGHT, STATUS_HEIGHT};
pub use terminal_view::{event_loop, TerminalView, Viewer};

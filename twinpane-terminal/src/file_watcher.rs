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

//! Reload-on-change for the viewed file.
//!
//! The parent directory is watched non-recursively so editors that save by
//! rename still produce events for the canonical path.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use twinpane_core::{Error, Result};

pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    event_rx: Receiver<()>,
}

impl FileWatcher {
    /// Start watching `file_path`
    pub fn watch(file_path: &Path) -> Result<Self> {
        let canonical = file_path
            .canonicalize()
            .unwrap_or_else(|_| file_path.to_path_buf());
        let (tx, event_rx) = channel();
        let target = canonical.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            if !matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            ) {
                return;
            }

            if event.paths.iter().any(|path| same_file(path, &target)) {
                let _ = tx.send(());
            }
        })
        .map_err(watcher_error)?;

        let parent = canonical
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(parent, RecursiveMode::NonRecursive)
            .map_err(watcher_error)?;
        tracing::debug!(path = %canonical.display(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            path: canonical,
            event_rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain pending events; true if the file changed since the last poll
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while self.event_rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

fn watcher_error(e: notify::Error) -> Error {
    Error::Watcher(e.to_string())
}

/// Editors that save by rename report a new path for the same file
fn same_file(path: &Path, target: &Path) -> bool {
    path == target || path.canonicalize().is_ok_and(|p| p == target)
}

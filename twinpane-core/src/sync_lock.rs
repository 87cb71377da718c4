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

//! Echo suppression for programmatic scroll writes.
//!
//! Writing a scroll offset to a pane makes that pane emit a scroll event of its
//! own. [`SyncLock`] is armed right before such a write and swallows every
//! scroll event until its window elapses. It is a time-bounded guard, not a
//! mutex: it clears itself on the first check past its deadline and offers no
//! way to release it early.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current time
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Idle,
    Locked { until: Instant },
}

#[derive(Debug, Clone)]
pub struct SyncLock {
    state: LockState,
    window: Duration,
}

impl SyncLock {
    pub fn new(window: Duration) -> Self {
        Self {
            state: LockState::Idle,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current state as of `now`, applying the scheduled unlock if it is due
    pub fn poll(&mut self, now: Instant) -> LockState {
        if let LockState::Locked { until } = self.state {
            if now >= until {
                self.state = LockState::Idle;
            }
        }
        self.state
    }

    pub fn is_locked(&mut self, now: Instant) -> bool {
        matches!(self.poll(now), LockState::Locked { .. })
    }

    /// Enter the locked state and schedule the unlock one window from `now`
    pub fn arm(&mut self, now: Instant) {
        self.state = LockState::Locked {
            until: now + self.window,
        };
    }
}

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

//! Configuration for the sync engine and its hosts.
//!
//! Loaded from a TOML file. Every field has a default, so an empty or missing
//! file yields `Config::default()`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long the lock stays armed after a programmatic scroll write
    pub lock_window_ms: u64,
    /// Map an offset at the very top/bottom of one pane to the very top/bottom of the other
    pub pin_edges: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lock_window_ms: 16,
            pin_edges: true,
        }
    }
}

impl SyncConfig {
    pub fn lock_window(&self) -> Duration {
        Duration::from_millis(self.lock_window_ms)
    }
}

/// Layout of the rendered pane in the terminal host (units are rows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub padding_top: u16,
    /// Blank rows between rendered blocks
    pub block_gap: u16,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            padding_top: 1,
            block_gap: 1,
        }
    }
}

impl Config {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sync engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.sync.lock_window_ms == 0 {
            return Err(Error::Config(
                "sync.lock_window_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load config from a file if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }
}

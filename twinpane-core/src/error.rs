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

//! Error types shared by the twinpane crates.
//!
//! The mapping engine itself never fails; these errors only come out of the
//! outer surfaces: reading files, loading configuration and setting up the
//! file watcher.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("File watcher error: {0}")]
    Watcher(String),
}

pub type Result<T> = std::result::Result<T, Error>;

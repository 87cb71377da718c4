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

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use twinpane_core::{Config, SourceBuffer, SyncCoordinator};
use twinpane_terminal::{
    cell_font, event_loop, CellMeasure, FileWatcher, SplitHost, SplitLayout, TerminalView, Viewer,
};

const APP_NAME: &str = "twinpane";
const LOG_ENV: &str = "TWINPANE_LOG";

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    View(Args),
}

#[derive(Debug, PartialEq)]
struct Args {
    file: PathBuf,
    config: Option<PathBuf>,
}

/// Parse command line arguments, program name excluded
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut file = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let Some(path) = args.next() else {
                    return Err(format!("{arg} requires a file path"));
                };
                config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(Command::Help),
            other if other.starts_with('-') && other != "-" => {
                return Err(format!("Unknown option '{other}'"));
            }
            _ => {
                if file.is_some() {
                    return Err(format!("Unexpected argument '{arg}'"));
                }
                file = Some(PathBuf::from(arg));
            }
        }
    }

    let file = file.ok_or_else(|| "Missing FILE argument".to_string())?;
    Ok(Command::View(Args { file, config }))
}

fn print_help() {
    println!("twinpane - markdown source and preview, scrolled together");
    println!();
    println!("USAGE:");
    println!("    twinpane [OPTIONS] FILE");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>  Config file (default: <config dir>/twinpane/config.toml)");
    println!("    -h, --help           Print this help message");
    println!();
    println!("KEYS:");
    println!("    Tab          Switch between source and preview");
    println!("    j/k, arrows  Scroll one row");
    println!("    PgUp/PgDn    Scroll one page");
    println!("    g/G          Top / bottom");
    println!("    q, C-c       Quit");
    println!();
    println!("Set {LOG_ENV} (e.g. {LOG_ENV}=debug) to control logging.");
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

/// An explicit config file must exist; the default one is optional
fn load_config(explicit: Option<&Path>) -> twinpane_core::Result<Config> {
    match explicit {
        Some(path) => Config::load_from(path),
        None => match default_config_path() {
            Some(path) => Config::load_or_default(&path),
            None => Ok(Config::default()),
        },
    }
}

/// Log to a file; the terminal is in raw mode while the viewer runs
fn init_tracing() -> Option<WorkerGuard> {
    let dir = dirs::cache_dir()?.join(APP_NAME);
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::never(&dir, format!("{APP_NAME}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

async fn terminal_main<W: Write>(
    device: W,
    path: &Path,
    text: &str,
    config: &Config,
) -> twinpane_core::Result<()> {
    let (columns, rows) = crossterm::terminal::size()?;
    let host = SplitHost::new(
        SourceBuffer::from_text(text),
        SplitLayout::new(columns, rows),
        config.preview.clone(),
    );
    let coordinator = SyncCoordinator::new(CellMeasure, cell_font(), &config.sync);
    let title = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let mut viewer = Viewer::new(host, coordinator, title);

    let watcher = match FileWatcher::watch(path) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(path = %path.display(), "not watching for changes: {e}");
            None
        }
    };

    let mut view = TerminalView::new(device);
    event_loop(&mut view, &mut viewer, watcher.as_ref()).await
}

fn enter_state(device: &mut impl Write) -> Result<(), std::io::Error> {
    enable_raw_mode()?;
    execute!(device, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(())
}

fn exit_state(device: &mut impl Write) -> Result<(), std::io::Error> {
    execute!(device, DisableMouseCapture)?;
    execute!(device, crossterm::cursor::Show)?;
    execute!(device, LeaveAlternateScreen)?;
    device.flush()?;
    disable_raw_mode()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::View(args)) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let text = match std::fs::read_to_string(&args.file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}: {e}", args.file.display());
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing();
    tracing::info!(file = %args.file.display(), "starting");

    std::panic::set_hook(Box::new(|panic_info| {
        let _ = exit_state(&mut std::io::stdout());
        eprintln!("twinpane crashed:");
        eprintln!("{panic_info}");
    }));

    let mut stdout = std::io::stdout();
    let result = match enter_state(&mut stdout) {
        Ok(()) => terminal_main(&mut stdout, &args.file, &text, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(cleanup_err) = exit_state(&mut stdout) {
        eprintln!("Warning: Failed to clean up terminal state: {cleanup_err}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

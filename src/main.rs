#![allow(non_snake_case)]

mod app;
mod components;
pub mod context;
mod theme;

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::Parser;
use dioxus::desktop::{Config, WindowBuilder};
use markframe_core::logging::LoggingBuilder;

/// Global download directory, set from command line
static DOWNLOAD_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Markdown loaded from the command line, if any
static INITIAL_DOCUMENT: OnceLock<String> = OnceLock::new();

/// Get the download directory (set from command line or the user default)
pub fn get_download_dir() -> PathBuf {
    DOWNLOAD_DIR.get().cloned().unwrap_or_else(|| {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Document shown when the editor opens
pub fn get_initial_document() -> String {
    INITIAL_DOCUMENT
        .get()
        .cloned()
        .unwrap_or_else(|| markframe_core::DEFAULT_DOCUMENT.to_string())
}

/// MarkFrame - Markdown and LaTeX on a glass card
#[derive(Parser, Debug)]
#[command(name = "markframe-desktop")]
#[command(about = "MarkFrame - Markdown and LaTeX on a glass card")]
struct Args {
    /// Markdown file to open
    file: Option<PathBuf>,

    /// Where exported PNGs are saved (default: your Downloads folder)
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Window width
    #[arg(long, default_value_t = 1400.0)]
    width: f64,

    /// Window height
    #[arg(long, default_value_t = 900.0)]
    height: f64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    LoggingBuilder::from_verbosity(args.verbose).init();

    if let Some(dir) = args.download_dir {
        let _ = DOWNLOAD_DIR.set(dir);
    }

    if let Some(path) = &args.file {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let _ = INITIAL_DOCUMENT.set(text);
            }
            Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    tracing::info!("Starting MarkFrame, exports go to {:?}", get_download_dir());

    // Configure desktop window
    let config = Config::new().with_window(
        WindowBuilder::new()
            .with_title("MarkFrame")
            .with_inner_size(dioxus::desktop::LogicalSize::new(args.width, args.height))
            .with_resizable(true),
    );

    dioxus::LaunchBuilder::desktop()
        .with_cfg(config)
        .launch(app::App);
}

//! MarkFrame CLI
//!
//! Thin wrapper around markframe-core for rendering without a window.
//!
//! ## Usage
//!
//! ```bash
//! # Render the built-in sample to a PNG in the current directory
//! markframe render --png .
//!
//! # Render a file and print the post-processed HTML
//! markframe render notes.md --html
//!
//! # Read from stdin, use a preset background and copy to the clipboard
//! cat notes.md | markframe render - --preset Sunset --copy
//!
//! # Dump the effective style as JSON (edit it and pass it back with --style)
//! markframe style > style.json
//! markframe render notes.md --style style.json --png ~/Pictures
//!
//! # List the built-in presets
//! markframe presets
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;

use markframe_core::capture::DirectoryDownloads;
use markframe_core::logging::LoggingBuilder;
use markframe_core::style::presets::{font_by_label, gradient_by_name, text_preset_by_name};
use markframe_core::style::{FONTS, PRESET_GRADIENTS, TEXT_PRESETS};
use markframe_core::upload::read_image_data_url;
use markframe_core::{
    compose, Background, CanvasGeometry, CapabilityKind, CapabilityRegistry, CapabilityStatus, CaptureEngine,
    CaptureNode, CaptureOutcome, CaptureTarget, RenderOutcome, RenderPipeline, StyleConfig, ThemeMode,
    DEFAULT_DOCUMENT,
};

/// MarkFrame - Markdown and LaTeX on a glass card
#[derive(Parser)]
#[command(name = "markframe")]
#[command(version = "0.1.0")]
#[command(about = "MarkFrame - Markdown and LaTeX on a glass card")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Markdown document
    Render(RenderArgs),

    /// Print the effective style as JSON
    Style(StyleArgs),

    /// List background, text color and font presets
    Presets,
}

#[derive(Args)]
struct RenderArgs {
    /// Markdown file, or "-" for stdin (default: built-in sample)
    input: Option<PathBuf>,

    /// Print the post-processed HTML to stdout
    #[arg(long)]
    html: bool,

    /// Save a PNG (3x) into this directory
    #[arg(long, value_name = "DIR")]
    png: Option<PathBuf>,

    /// Copy a PNG (2x) to the clipboard
    #[arg(long)]
    copy: bool,

    /// Card width in CSS pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Card height in CSS pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    #[command(flatten)]
    styling: StyleArgs,
}

#[derive(Args)]
struct StyleArgs {
    /// Style JSON file to start from
    #[arg(long)]
    style: Option<PathBuf>,

    /// Preset gradient name
    #[arg(long)]
    preset: Option<String>,

    /// Background image (png, jpg, webp)
    #[arg(long, conflicts_with = "preset")]
    image: Option<PathBuf>,

    /// Background image brightness, percent
    #[arg(long)]
    brightness: Option<u32>,

    /// Backdrop blur, px
    #[arg(long)]
    blur: Option<u32>,

    /// Tint opacity, percent
    #[arg(long)]
    opacity: Option<u32>,

    /// Card padding, px
    #[arg(long)]
    padding: Option<u32>,

    /// Card corner radius, px
    #[arg(long)]
    radius: Option<u32>,

    /// Text color preset name
    #[arg(long)]
    text_color: Option<String>,

    /// Font label (e.g. Modern, Code)
    #[arg(long)]
    font: Option<String>,

    /// light or dark
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    LoggingBuilder::from_verbosity(cli.verbose).init();

    match cli.command {
        Commands::Render(args) => cmd_render(args).await,
        Commands::Style(args) => cmd_style(&args),
        Commands::Presets => {
            cmd_presets();
            Ok(())
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_render(args: RenderArgs) -> Result<()> {
    let document = read_document(args.input.as_deref()).await?;
    let style = resolve_style(&args.styling)?;
    let geometry = CanvasGeometry::clamped(f64::from(args.width), f64::from(args.height));

    let registry = Arc::new(CapabilityRegistry::new());
    for handle in registry.request_defaults() {
        handle.await.context("capability loader panicked")?;
    }
    for kind in CapabilityKind::ALL {
        if let CapabilityStatus::Error(reason) = registry.status(kind) {
            tracing::warn!(capability = %kind, %reason, "continuing without capability");
        }
    }

    let pipeline = RenderPipeline::new(Arc::clone(&registry)).with_theme(style.theme);
    let (outcome, report) = pipeline.render_now(&document)?;
    if outcome == RenderOutcome::Deferred {
        bail!("markdown parser unavailable");
    }
    tracing::info!(
        spans = report.spans_typeset,
        failed = report.spans_failed,
        blocks = report.blocks_highlighted,
        "document rendered"
    );

    let print_html = args.html || (args.png.is_none() && !args.copy);
    if print_html {
        println!("{}", pipeline.html());
    }

    if args.png.is_none() && !args.copy {
        return Ok(());
    }

    let (width, height) = geometry.pixel_size();
    let node = CaptureNode::new(width, height, compose(&style), pipeline.html());
    let mut engine = CaptureEngine::new(registry);

    if let Some(dir) = args.png {
        engine = engine.with_downloads(Arc::new(DirectoryDownloads::new(dir)));
        match engine.capture(&node, CaptureTarget::File).await {
            Ok(CaptureOutcome::Saved { path, .. }) => println!("Saved: {}", path.display()),
            Ok(other) => tracing::debug!(?other, "unexpected capture outcome"),
            Err(e) => bail!(e.user_message().map(str::to_string).unwrap_or_else(|| e.to_string())),
        }
    }

    if args.copy {
        match engine.capture(&node, CaptureTarget::Clipboard).await {
            Ok(CaptureOutcome::Copied { width, height }) => {
                println!("Copied {}x{} image to clipboard", width, height)
            }
            Ok(other) => tracing::debug!(?other, "unexpected capture outcome"),
            Err(e) => bail!(e.user_message().map(str::to_string).unwrap_or_else(|| e.to_string())),
        }
    }

    Ok(())
}

fn cmd_style(args: &StyleArgs) -> Result<()> {
    let style = resolve_style(args)?;
    println!("{}", serde_json::to_string_pretty(&style)?);
    Ok(())
}

fn cmd_presets() {
    println!("Backgrounds:");
    for preset in &PRESET_GRADIENTS {
        println!("  {:<16} {}", preset.name, preset.css());
    }

    println!();
    println!("Text colors:");
    for preset in &TEXT_PRESETS {
        println!("  {:<16} {} ({} theme)", preset.name, preset.color, preset.theme_mode());
    }

    println!();
    println!("Fonts:");
    for font in &FONTS {
        println!("  {:<16} {}", font.label, font.family);
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn read_document(input: Option<&Path>) -> Result<String> {
    match input {
        None => Ok(DEFAULT_DOCUMENT.to_string()),
        Some(path) if path.as_os_str() == "-" => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read stdin")?;
            Ok(text)
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Style file first, then individual flags on top.
fn resolve_style(args: &StyleArgs) -> Result<StyleConfig> {
    let mut style = match &args.style {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            StyleConfig::from_json(&json)?
        }
        None => StyleConfig::default(),
    };

    if let Some(name) = &args.preset {
        let Some(preset) = gradient_by_name(name) else {
            bail!("Unknown background preset: {name} (see `markframe presets`)");
        };
        style.set_background(Background::Gradient {
            preset: preset.name.to_string(),
        });
    }
    if let Some(path) = &args.image {
        let data_url = read_image_data_url(path)?;
        style.set_background(Background::Image {
            data_url,
            brightness: 100,
        });
    }
    if let Some(percent) = args.brightness {
        style.set_brightness(percent);
    }
    if let Some(px) = args.blur {
        style.set_blur(px);
    }
    if let Some(percent) = args.opacity {
        style.set_opacity(percent);
    }
    if let Some(px) = args.padding {
        style.set_padding(px);
    }
    if let Some(px) = args.radius {
        style.set_radius(px);
    }
    if let Some(name) = &args.text_color {
        let Some(preset) = text_preset_by_name(name) else {
            bail!("Unknown text color preset: {name} (see `markframe presets`)");
        };
        style.apply_text_preset(preset);
    }
    if let Some(label) = &args.font {
        let Some(font) = font_by_label(label) else {
            bail!("Unknown font: {label} (see `markframe presets`)");
        };
        style.typography.font = font.family.to_string();
    }
    if let Some(theme) = &args.theme {
        style.set_theme(theme.parse::<ThemeMode>()?);
    }

    Ok(style)
}

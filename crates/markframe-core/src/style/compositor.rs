//! StyleConfig -> the concrete layers of the glass card.
//!
//! ```text
//!   ┌──────────── preview frame (background) ────────────┐
//!   │   ┌──────────── card ─────────────────────────┐    │
//!   │   │ blur layer: background, filter, scale 1.03│    │
//!   │   │ tint layer: rgba over the blur            │    │
//!   │   │ border + window dots + content            │    │
//!   │   └───────────────────────────────────────────┘    │
//!   └────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use super::presets::gradient_by_name;
use super::{Background, Gradient, GradientDirection, GradientStop, Rgb, StyleConfig, ThemeMode, PRESET_GRADIENTS};

/// Scale applied to the blur layer so its blurred edges fall outside the card.
pub const BLUR_LAYER_ZOOM: f32 = 1.03;

/// Corner radius of the preview frame, px.
pub const FRAME_RADIUS: u32 = 36;

/// Inset of the card inside the preview frame, px.
pub const FRAME_INSET: u32 = 48;

/// Window-control dots: colors, diameter, gap, offset from the card corner.
pub const WINDOW_DOTS: [Rgb; 3] = [Rgb::hex(0xff5f56), Rgb::hex(0xffbd2e), Rgb::hex(0x27c93f)];
pub const WINDOW_DOT_SIZE: u32 = 12;
pub const WINDOW_DOT_GAP: u32 = 8;
pub const WINDOW_DOT_OFFSET: u32 = 24;
pub const WINDOW_DOT_OPACITY: f32 = 0.8;

const DARK_TINT: Rgb = Rgb::hex(0x0f172a);

/// A color with alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

impl Rgba {
    pub fn new(rgb: Rgb, alpha: f32) -> Self {
        Self {
            rgb,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    /// CSS `rgba(r, g, b, a)`.
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.rgb.r, self.rgb.g, self.rgb.b, self.alpha)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

/// What a rasterizer paints as the backdrop.
#[derive(Debug, Clone, PartialEq)]
pub enum BackdropPaint {
    Gradient(Gradient),
    Image { data_url: String, brightness: u32 },
}

/// Output of [`compose`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompositedStyle {
    /// CSS `background` value for the frame and blur layer
    pub background: String,
    /// CSS filter on the background itself (image brightness)
    pub background_filter: Option<String>,
    /// CSS filter on the blur layer
    pub blur_filter: String,
    pub blur_px: u32,
    pub tint: Rgba,
    pub border: Rgba,
    pub padding: u32,
    pub radius: u32,
    pub text_color: Rgb,
    pub font: String,
    pub font_size_px: u32,
    pub theme: ThemeMode,
    pub paint: BackdropPaint,
}

impl CompositedStyle {
    /// `1px solid rgba(..)` border declaration.
    pub fn border_css(&self) -> String {
        format!(
            "1px solid rgba({},{},{},{})",
            self.border.rgb.r, self.border.rgb.g, self.border.rgb.b, self.border.alpha
        )
    }

    /// Inline style of the blur layer.
    pub fn blur_layer_css(&self) -> String {
        format!(
            "background: {}; background-size: cover; background-position: center; filter: {}; transform: scale({});",
            self.background, self.blur_filter, BLUR_LAYER_ZOOM
        )
    }

    /// Inline style of the preview frame.
    pub fn frame_css(&self) -> String {
        let mut css = format!(
            "background: {}; background-size: cover; background-position: center;",
            self.background
        );
        if let Some(filter) = &self.background_filter {
            css.push_str(&format!(" filter: {filter};"));
        }
        css
    }
}

fn preset_gradient(name: &str) -> Gradient {
    gradient_by_name(name)
        .unwrap_or(&PRESET_GRADIENTS[0])
        .gradient()
}

fn custom_gradient(start: Rgb, end: Rgb, direction: GradientDirection) -> Gradient {
    Gradient {
        direction,
        stops: vec![GradientStop::auto(start), GradientStop::auto(end)],
    }
}

/// Derive every layer of the card from `style`.
///
/// Unknown preset names fall back to the first preset.
pub fn compose(style: &StyleConfig) -> CompositedStyle {
    let (background, background_filter, paint) = match &style.background {
        Background::Image { data_url, brightness } => (
            format!("url({data_url})"),
            Some(format!("brightness({brightness}%)")),
            BackdropPaint::Image {
                data_url: data_url.clone(),
                brightness: *brightness,
            },
        ),
        Background::CustomGradient { start, end, direction } => {
            let gradient = custom_gradient(*start, *end, *direction);
            (gradient.css(), None, BackdropPaint::Gradient(gradient))
        }
        Background::Gradient { preset } => {
            let gradient = preset_gradient(preset);
            (gradient.css(), None, BackdropPaint::Gradient(gradient))
        }
    };

    let blur_filter = match &background_filter {
        Some(filter) => format!("{filter} blur({}px)", style.blur),
        None => format!("blur({}px)", style.blur),
    };

    let alpha = style.opacity as f32 / 100.0;
    let (tint, border) = match style.theme {
        ThemeMode::Light => (Rgba::new(Rgb::hex(0xffffff), alpha), Rgba::new(Rgb::hex(0xffffff), 0.6)),
        ThemeMode::Dark => (Rgba::new(DARK_TINT, alpha), Rgba::new(Rgb::hex(0xffffff), 0.15)),
    };

    CompositedStyle {
        background,
        background_filter,
        blur_filter,
        blur_px: style.blur,
        tint,
        border,
        padding: style.padding,
        radius: style.radius,
        text_color: style.typography.color,
        font: style.typography.font.clone(),
        font_size_px: style.typography.size_px,
        theme: style.theme,
        paint,
    }
}

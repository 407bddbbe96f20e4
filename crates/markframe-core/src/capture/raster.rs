//! Software rasterizer for the glass card.
//!
//! Paints the layers a browser would composite, at a device pixel ratio:
//!
//! ```text
//!   1. frame      backdrop clipped to a rounded rect (radius 36)
//!   2. blur layer backdrop sized to the card, blurred, zoomed 1.03,
//!                 clipped to the card radius
//!   3. tint       flat rgba over the card
//!   4. border     1px ring on the card edge
//!   5. content    laid-out text, code and math, clipped to the card
//!   6. dots       three window-control circles
//! ```
//!
//! Every length is multiplied by the pixel ratio, so a ratio of 3 yields the
//! same picture with three times the pixels.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, GradientStop, IntSize, LinearGradient, Mask, Paint, Path,
    PathBuilder, Pattern, Pixmap, PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};
use tracing::trace;

use super::content::ContentLayout;
use super::fonts::FontLibrary;
use super::text::TextEngine;
use super::CaptureNode;
use crate::dataurl::decode_data_url;
use crate::style::compositor::{
    BackdropPaint, Rgba, BLUR_LAYER_ZOOM, FRAME_INSET, FRAME_RADIUS, WINDOW_DOTS, WINDOW_DOT_GAP,
    WINDOW_DOT_OFFSET, WINDOW_DOT_OPACITY, WINDOW_DOT_SIZE,
};
use crate::style::{Gradient, Rgb};

/// Largest sigma blurred at full resolution; bigger blurs run on a
/// downscaled copy.
const MAX_DIRECT_SIGMA: f32 = 8.0;

/// Card border width, CSS px.
const CARD_BORDER: f32 = 1.0;

/// Cubic approximation of a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// A rasterization capability.
pub trait Rasterizer: Send + Sync {
    /// Paint `node` at `pixel_ratio`; the result is exactly
    /// `node.width * pixel_ratio` by `node.height * pixel_ratio`.
    fn rasterize(&self, node: &CaptureNode, pixel_ratio: u32) -> Result<RgbaImage, String>;

    /// Height in CSS px the node needs to show all of its content.
    ///
    /// The card is a `min-height` box, so a capture grows to this when it is
    /// taller than the node.
    fn natural_height(&self, _node: &CaptureNode) -> Option<u32> {
        None
    }
}

/// Paints the card chrome and its content.
#[derive(Debug, Clone)]
pub struct GlassRasterizer {
    fonts: Arc<FontLibrary>,
}

impl Default for GlassRasterizer {
    fn default() -> Self {
        Self::new(FontLibrary::system())
    }
}

impl GlassRasterizer {
    pub fn new(fonts: Arc<FontLibrary>) -> Self {
        Self { fonts }
    }

    /// Content box of `node` as `(left, top, width)`, CSS px.
    fn content_box(node: &CaptureNode) -> (f32, f32, f32) {
        let edge = FRAME_INSET as f32 + CARD_BORDER + node.style.padding as f32;
        let width = node.width as f32 - 2.0 * edge;
        (edge, edge + WINDOW_DOT_OFFSET as f32, width.max(1.0))
    }

    fn layout(&self, node: &CaptureNode, engine: &mut TextEngine<'_>) -> ContentLayout {
        let (_, _, width) = Self::content_box(node);
        ContentLayout::build(&node.content_html, width, &node.style, engine)
    }
}

impl Rasterizer for GlassRasterizer {
    fn rasterize(&self, node: &CaptureNode, pixel_ratio: u32) -> Result<RgbaImage, String> {
        let ratio = pixel_ratio.max(1);
        let width = node.width.checked_mul(ratio).ok_or("capture width overflow")?;
        let height = node.height.checked_mul(ratio).ok_or("capture height overflow")?;
        if width == 0 || height == 0 {
            return Err(format!("cannot capture an empty node ({}x{})", node.width, node.height));
        }
        let s = ratio as f32;
        let style = &node.style;
        trace!(width, height, ratio, "rasterizing glass card");

        let mut canvas = Pixmap::new(width, height).ok_or("cannot allocate capture canvas")?;

        // 1. Frame
        let backdrop = paint_backdrop(&style.paint, width, height)?;
        if let Some(frame) = rounded_rect(0.0, 0.0, width as f32, height as f32, FRAME_RADIUS as f32 * s) {
            let mut paint = Paint::default();
            paint.shader = Pattern::new(
                backdrop.as_ref(),
                SpreadMode::Pad,
                FilterQuality::Nearest,
                1.0,
                Transform::identity(),
            );
            canvas.fill_path(&frame, &paint, FillRule::Winding, Transform::identity(), None);
        }

        // 2-6 need room for the card inside the frame inset
        let inset = FRAME_INSET * ratio;
        let (card_w, card_h) = match (width.checked_sub(2 * inset), height.checked_sub(2 * inset)) {
            (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
            _ => return to_image(&canvas),
        };
        let (x, y) = (inset as f32, inset as f32);
        let radius = style.radius as f32 * s;
        let card = rounded_rect(x, y, card_w as f32, card_h as f32, radius).ok_or("degenerate card")?;
        let mut clip = Mask::new(width, height).ok_or("cannot allocate card mask")?;
        clip.fill_path(&card, FillRule::Winding, true, Transform::identity());

        let layer = paint_backdrop(&style.paint, card_w, card_h)?;
        let layer = blur_layer(&layer, style.blur_px as f32 * s)?;
        canvas.draw_pixmap(
            inset as i32,
            inset as i32,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            Some(&clip),
        );

        canvas.fill_path(&card, &solid_paint(style.tint), FillRule::Winding, Transform::identity(), None);

        let border = (CARD_BORDER * s).max(1.0);
        let half = border / 2.0;
        if let Some(ring) = rounded_rect(
            x + half,
            y + half,
            card_w as f32 - border,
            card_h as f32 - border,
            (radius - half).max(0.0),
        ) {
            let stroke = Stroke {
                width: border,
                ..Stroke::default()
            };
            canvas.stroke_path(&ring, &solid_paint(style.border), &stroke, Transform::identity(), None);
        }

        let mut engine = TextEngine::new(&self.fonts, &style.font);
        let content = self.layout(node, &mut engine);
        let (left, top, _) = Self::content_box(node);
        content.paint(&mut canvas, &mut engine, (left * s, top * s), s, Some(&clip));

        let size = WINDOW_DOT_SIZE as f32 * s;
        let dot_radius = size / 2.0;
        let dot_top = y + WINDOW_DOT_OFFSET as f32 * s;
        for (i, color) in WINDOW_DOTS.iter().enumerate() {
            let left = x + WINDOW_DOT_OFFSET as f32 * s + i as f32 * (size + WINDOW_DOT_GAP as f32 * s);
            if let Some(dot) = PathBuilder::from_circle(left + dot_radius, dot_top + dot_radius, dot_radius) {
                let paint = solid_paint(Rgba::new(*color, WINDOW_DOT_OPACITY));
                canvas.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }

        to_image(&canvas)
    }

    fn natural_height(&self, node: &CaptureNode) -> Option<u32> {
        let mut engine = TextEngine::new(&self.fonts, &node.style.font);
        let content = self.layout(node, &mut engine);
        let (_, top, _) = Self::content_box(node);
        let bottom = CARD_BORDER + node.style.padding as f32 + FRAME_INSET as f32;
        let height = (top + content.height() + bottom).ceil();
        (height.is_finite() && height <= u32::MAX as f32).then_some(height as u32)
    }
}

/// Rounded rectangle path; `None` when the rect is empty.
pub(super) fn rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    if r == 0.0 {
        return Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect);
    }
    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn skia_color(color: Rgba) -> Color {
    let alpha = (color.alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::from_rgba8(color.rgb.r, color.rgb.g, color.rgb.b, alpha)
}

pub(super) fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

/// Fill a `width` x `height` pixmap with the backdrop.
fn paint_backdrop(paint: &BackdropPaint, width: u32, height: u32) -> Result<Pixmap, String> {
    match paint {
        BackdropPaint::Gradient(gradient) => paint_gradient(gradient, width, height),
        BackdropPaint::Image { data_url, brightness } => {
            let (_, bytes) = decode_data_url(data_url).map_err(|e| e.to_string())?;
            let image = image::load_from_memory(&bytes)
                .map_err(|e| format!("background image: {e}"))?
                .to_rgba8();
            let mut cover = cover_fit(&image, width, height);
            apply_brightness(&mut cover, *brightness);
            to_pixmap(&cover)
        }
    }
}

/// CSS `linear-gradient` over a `width` x `height` box.
fn paint_gradient(gradient: &Gradient, width: u32, height: u32) -> Result<Pixmap, String> {
    let mut pixmap = Pixmap::new(width, height).ok_or("cannot allocate backdrop")?;
    let resolved = gradient.resolved_stops();
    let first = resolved.first().map(|(_, rgb)| *rgb).unwrap_or(Rgb::new(0, 0, 0));
    let stops: Vec<GradientStop> = resolved
        .into_iter()
        .map(|(position, rgb)| GradientStop::new((position / 100.0).clamp(0.0, 1.0), skia_color(Rgba::new(rgb, 1.0))))
        .collect();

    // The gradient line passes through the center at the CSS angle and
    // spans the box's projection onto it
    let theta = gradient.direction.angle_deg().to_radians();
    let (dx, dy) = (theta.sin(), -theta.cos());
    let (w, h) = (width as f32, height as f32);
    let half = 0.5 * (w * dx.abs() + h * dy.abs());
    let (cx, cy) = (w / 2.0, h / 2.0);
    let start = Point::from_xy(cx - dx * half, cy - dy * half);
    let end = Point::from_xy(cx + dx * half, cy + dy * half);

    let mut paint = Paint::default();
    match LinearGradient::new(start, end, stops, SpreadMode::Pad, Transform::identity()) {
        Some(shader) => paint.shader = shader,
        None => paint.set_color(skia_color(Rgba::new(first, 1.0))),
    }
    let rect = Rect::from_xywh(0.0, 0.0, w, h).ok_or("empty backdrop")?;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    Ok(pixmap)
}

/// `background-size: cover; background-position: center`.
fn cover_fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (iw, ih) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let scale = (width as f32 / iw).max(height as f32 / ih);
    let sw = ((iw * scale).ceil() as u32).max(width);
    let sh = ((ih * scale).ceil() as u32).max(height);
    let scaled = imageops::resize(image, sw, sh, FilterType::Triangle);
    imageops::crop_imm(&scaled, (sw - width) / 2, (sh - height) / 2, width, height).to_image()
}

fn apply_brightness(image: &mut RgbaImage, percent: u32) {
    if percent == 100 {
        return;
    }
    let factor = percent as f32 / 100.0;
    for pixel in image.pixels_mut() {
        for c in 0..3 {
            pixel.0[c] = (pixel.0[c] as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Gaussian blur with `sigma` px, then the 1.03 zoom about the center.
fn blur_layer(layer: &Pixmap, sigma: f32) -> Result<Pixmap, String> {
    let (w, h) = (layer.width(), layer.height());
    let layer = to_image(layer)?;
    let blurred = if sigma <= 0.0 {
        layer
    } else if sigma <= MAX_DIRECT_SIGMA {
        imageops::blur(&layer, sigma)
    } else {
        let factor = (sigma / MAX_DIRECT_SIGMA).ceil();
        let sw = ((w as f32 / factor).round() as u32).max(1);
        let sh = ((h as f32 / factor).round() as u32).max(1);
        let small = imageops::resize(&layer, sw, sh, FilterType::Triangle);
        let small = imageops::blur(&small, sigma / factor);
        imageops::resize(&small, w, h, FilterType::Triangle)
    };

    let zw = ((w as f32 * BLUR_LAYER_ZOOM).round() as u32).max(w);
    let zh = ((h as f32 * BLUR_LAYER_ZOOM).round() as u32).max(h);
    if (zw, zh) == (w, h) {
        return to_pixmap(&blurred);
    }
    let zoomed = imageops::resize(&blurred, zw, zh, FilterType::Triangle);
    to_pixmap(&imageops::crop_imm(&zoomed, (zw - w) / 2, (zh - h) / 2, w, h).to_image())
}

fn to_pixmap(image: &RgbaImage) -> Result<Pixmap, String> {
    let size = IntSize::from_wh(image.width(), image.height()).ok_or("empty image")?;
    let data = image
        .pixels()
        .flat_map(|p| {
            let c = ColorU8::from_rgba(p.0[0], p.0[1], p.0[2], p.0[3]).premultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size).ok_or_else(|| "pixel buffer size mismatch".to_string())
}

fn to_image(pixmap: &Pixmap) -> Result<RgbaImage, String> {
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or_else(|| "pixel buffer size mismatch".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataurl::to_data_url;
    use crate::style::{compose, Background, GradientDirection, StyleConfig, ThemeMode};

    fn node(width: u32, height: u32, style: &StyleConfig) -> CaptureNode {
        CaptureNode::new(width, height, compose(style), String::new())
    }

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn flat_black() -> StyleConfig {
        let mut style = StyleConfig::default();
        style.set_background(Background::CustomGradient {
            start: Rgb::hex(0x000000),
            end: Rgb::hex(0x000000),
            direction: GradientDirection::ToRight,
        });
        style.set_blur(0);
        style.set_opacity(0);
        style.typography.color = Rgb::hex(0xffffff);
        style
    }

    #[test]
    fn test_output_matches_pixel_ratio() {
        let style = StyleConfig::default();
        for ratio in [1, 2, 3] {
            let image = GlassRasterizer::default().rasterize(&node(300, 200, &style), ratio).unwrap();
            assert_eq!(image.dimensions(), (300 * ratio, 200 * ratio));
        }
    }

    #[test]
    fn test_frame_corners_are_transparent() {
        let image = GlassRasterizer::default()
            .rasterize(&node(300, 200, &StyleConfig::default()), 1)
            .unwrap();
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(299, 199).0[3], 0);
        // Center is fully opaque
        assert_eq!(image.get_pixel(150, 100).0[3], 255);
    }

    #[test]
    fn test_tint_lightens_card_in_light_mode() {
        let mut style = flat_black();
        style.set_opacity(50);
        let image = GlassRasterizer::default().rasterize(&node(300, 200, &style), 1).unwrap();
        // Outside the card: plain black frame
        assert_eq!(image.get_pixel(10, 100).0[..3], [0, 0, 0]);
        // Inside the card: black under 50% white
        let inside = image.get_pixel(200, 150).0;
        assert!((120..=135).contains(&inside[0]), "got {inside:?}");
    }

    #[test]
    fn test_dark_tint() {
        let mut style = StyleConfig::default();
        style.set_background(Background::CustomGradient {
            start: Rgb::hex(0xffffff),
            end: Rgb::hex(0xffffff),
            direction: GradientDirection::ToRight,
        });
        style.set_blur(0);
        style.set_opacity(100);
        style.set_theme(ThemeMode::Dark);
        let image = GlassRasterizer::default().rasterize(&node(300, 200, &style), 1).unwrap();
        assert_eq!(image.get_pixel(200, 150).0, [15, 23, 42, 255]);
    }

    #[test]
    fn test_window_dots_painted() {
        let mut style = StyleConfig::default();
        style.set_opacity(0);
        let image = GlassRasterizer::default().rasterize(&node(300, 200, &style), 2).unwrap();
        // Center of the red dot: inset 48 + offset 24 + radius 6, times 2
        let red = image.get_pixel(156, 156).0;
        assert!(red[0] > red[1] && red[0] > red[2], "got {red:?}");
    }

    #[test]
    fn test_content_changes_pixels() {
        let fonts = FontLibrary::system();
        if fonts.is_empty() {
            return;
        }
        let rasterizer = GlassRasterizer::new(fonts);
        let style = compose(&flat_black());
        let paint = |html: &str| {
            let node = CaptureNode::new(400, 300, style.clone(), html.to_string());
            rasterizer.rasterize(&node, 1).unwrap()
        };

        let empty = paint("");
        let hello = paint("<p>Hello glass</p>");
        let other = paint("<p>Goodbye frame</p>");
        assert_ne!(hello, empty);
        assert_ne!(hello, other);

        // White text lands inside the content box on the black card
        let (left, top, width) = GlassRasterizer::content_box(&CaptureNode::new(400, 300, style.clone(), String::new()));
        let lit = (left as u32..(left + width) as u32)
            .flat_map(|x| (top as u32..top as u32 + 30).map(move |y| (x, y)))
            .filter(|(x, y)| hello.get_pixel(*x, *y).0[0] > 150)
            .count();
        assert!(lit > 10, "only {lit} lit pixels");
        assert_eq!(empty.get_pixel(left as u32 + 2, top as u32 + 10).0[..3], [0, 0, 0]);
    }

    #[test]
    fn test_code_and_math_paint() {
        let fonts = FontLibrary::system();
        if fonts.is_empty() {
            return;
        }
        let rasterizer = GlassRasterizer::new(fonts);
        let style = compose(&flat_black());
        let paint = |html: &str| {
            let node = CaptureNode::new(400, 300, style.clone(), html.to_string());
            rasterizer.rasterize(&node, 2).unwrap()
        };
        let plain = paint("<pre><code class=\"hljs\">fn main() {}\n</code></pre>");
        let colored =
            paint("<pre><code class=\"hljs\"><span style=\"color:#ff0000;\">fn</span> main() {}\n</code></pre>");
        assert_ne!(plain, colored);
        assert!(colored.pixels().any(|p| p.0[0] > 150 && p.0[1] < 80 && p.0[2] < 80));

        let math = paint("<p><span class=\"math math-inline\"><math><msup><mi>x</mi><mn>2</mn></msup></math></span></p>");
        assert_ne!(math, paint(""));
    }

    #[test]
    fn test_natural_height_grows_with_content() {
        let rasterizer = GlassRasterizer::new(Arc::new(FontLibrary::empty()));
        let style = compose(&StyleConfig::default());
        // inset 48, border 1, padding 64 on both sides plus the dot offset
        let empty = CaptureNode::new(400, 300, style.clone(), String::new());
        assert_eq!(rasterizer.natural_height(&empty), Some(2 * (48 + 1 + 64) + 24));

        let long = CaptureNode::new(400, 300, style, "<p>line</p>".repeat(30));
        let grown = rasterizer.natural_height(&long).unwrap();
        assert!(grown > 300 + 30 * 26, "{grown}");
    }

    #[test]
    fn test_gradient_direction() {
        let gradient = Gradient {
            direction: GradientDirection::ToRight,
            stops: vec![
                crate::style::GradientStop::auto(Rgb::hex(0x000000)),
                crate::style::GradientStop::auto(Rgb::hex(0xffffff)),
            ],
        };
        let pixmap = paint_gradient(&gradient, 100, 10).unwrap();
        assert!(pixel(&pixmap, 0, 5)[0] < 10);
        assert!(pixel(&pixmap, 99, 5)[0] > 245);
        assert_eq!(pixel(&pixmap, 50, 0), pixel(&pixmap, 50, 9));
    }

    #[test]
    fn test_image_background_cover_and_brightness() {
        let source = RgbaImage::from_pixel(4, 2, image::Rgba([200, 100, 50, 255]));
        let mut png = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let paint = BackdropPaint::Image {
            data_url: to_data_url("image/png", &png),
            brightness: 50,
        };
        let pixmap = paint_backdrop(&paint, 30, 30).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (30, 30));
        let center = pixel(&pixmap, 15, 15);
        for (got, want) in center.iter().zip([100u8, 50, 25, 255]) {
            assert!(got.abs_diff(want) <= 1, "got {center:?}");
        }
    }

    #[test]
    fn test_bad_image_is_error() {
        let paint = BackdropPaint::Image {
            data_url: to_data_url("image/png", b"nope"),
            brightness: 100,
        };
        assert!(paint_backdrop(&paint, 10, 10).is_err());
    }

    #[test]
    fn test_empty_node_is_error() {
        assert!(GlassRasterizer::default()
            .rasterize(&node(0, 200, &StyleConfig::default()), 1)
            .is_err());
    }

    #[test]
    fn test_heavy_blur_keeps_size() {
        let layer = to_pixmap(&RgbaImage::from_pixel(120, 80, image::Rgba([10, 200, 30, 255]))).unwrap();
        let blurred = blur_layer(&layer, 120.0).unwrap();
        assert_eq!((blurred.width(), blurred.height()), (120, 80));
    }

    #[test]
    fn test_rounded_rect_rejects_empty() {
        assert!(rounded_rect(0.0, 0.0, 0.0, 10.0, 4.0).is_none());
        assert!(rounded_rect(0.0, 0.0, 10.0, 10.0, 0.0).is_some());
        assert!(rounded_rect(0.0, 0.0, 10.0, 10.0, 40.0).is_some());
    }
}

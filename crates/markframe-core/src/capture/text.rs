//! Shaping and painting of text runs.
//!
//! Runs are shaped with swash, measured by summing glyph advances, and
//! painted one glyph mask at a time onto a tiny-skia pixmap. Without an
//! installed face a run is measured from its character count and skipped
//! when painting.

use std::collections::HashMap;
use std::sync::Arc;

use swash::scale::image::{Content, Image};
use swash::scale::{Render, ScaleContext, Source};
use swash::shape::ShapeContext;
use swash::zeno::{Format, Vector};
use tiny_skia::{ColorU8, Mask, Pixmap, PixmapPaint, Transform};

use super::fonts::{FaceRequest, FontFace, FontLibrary};
use crate::style::compositor::Rgba;

/// Ascent and descent as fractions of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    pub ascent: f32,
    pub descent: f32,
}

const FALLBACK_METRICS: VerticalMetrics = VerticalMetrics {
    ascent: 0.8,
    descent: 0.2,
};

/// Per-capture shaping state for one font family.
pub struct TextEngine<'a> {
    fonts: &'a FontLibrary,
    family: &'a str,
    faces: HashMap<FaceRequest, Option<Arc<FontFace>>>,
    shape: ShapeContext,
    scale: ScaleContext,
}

impl<'a> TextEngine<'a> {
    pub fn new(fonts: &'a FontLibrary, family: &'a str) -> Self {
        Self {
            fonts,
            family,
            faces: HashMap::new(),
            shape: ShapeContext::new(),
            scale: ScaleContext::new(),
        }
    }

    fn face(&mut self, request: FaceRequest) -> Option<Arc<FontFace>> {
        let (fonts, family) = (self.fonts, self.family);
        self.faces
            .entry(request)
            .or_insert_with(|| fonts.face(family, request))
            .clone()
    }

    /// Advance width of `text` at `size` px.
    pub fn measure(&mut self, text: &str, request: FaceRequest, size: f32) -> f32 {
        let Some(face) = self.face(request) else {
            return estimate_width(text, request, size);
        };
        let Some(font) = face.font() else {
            return estimate_width(text, request, size);
        };
        let mut shaper = self.shape.builder(font).size(size).build();
        shaper.add_str(text);
        let mut width = 0.0;
        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                width += glyph.advance;
            }
        });
        width
    }

    pub fn metrics(&mut self, request: FaceRequest) -> VerticalMetrics {
        let Some(face) = self.face(request) else {
            return FALLBACK_METRICS;
        };
        let Some(font) = face.font() else {
            return FALLBACK_METRICS;
        };
        let metrics = font.metrics(&[]);
        let em = metrics.units_per_em as f32;
        if em <= 0.0 {
            return FALLBACK_METRICS;
        }
        VerticalMetrics {
            ascent: metrics.ascent / em,
            descent: metrics.descent.abs() / em,
        }
    }

    /// Paint `text` with its left edge at `x` and baseline at `baseline`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        request: FaceRequest,
        size: f32,
        x: f32,
        baseline: f32,
        color: Rgba,
        clip: Option<&Mask>,
    ) {
        let Some(face) = self.face(request) else {
            return;
        };
        let Some(font) = face.font() else {
            return;
        };
        let embolden = if face.synthetic_bold { size / 28.0 } else { 0.0 };

        let mut shaper = self.shape.builder(font).size(size).build();
        shaper.add_str(text);
        let mut scaler = self.scale.builder(font).size(size).hint(false).build();

        let mut pen = x;
        let top = baseline.round();
        shaper.shape_with(|cluster| {
            for glyph in cluster.glyphs {
                let gx = pen + glyph.x;
                let rendered = Render::new(&[Source::Outline])
                    .format(Format::Alpha)
                    .embolden(embolden)
                    .offset(Vector::new(gx.fract(), 0.0))
                    .render(&mut scaler, glyph.id);
                if let Some(image) = rendered {
                    blit_glyph(canvas, &image, gx.floor() as i32, (top - glyph.y) as i32, color, clip);
                }
                pen += glyph.advance;
            }
        });
    }
}

fn estimate_width(text: &str, request: FaceRequest, size: f32) -> f32 {
    let per_char = if request.mono { 0.6 } else { 0.55 };
    text.chars().count() as f32 * size * per_char
}

/// Composite one glyph coverage mask in `color`.
fn blit_glyph(canvas: &mut Pixmap, image: &Image, x: i32, baseline: i32, color: Rgba, clip: Option<&Mask>) {
    if !matches!(image.content, Content::Mask) {
        return;
    }
    let Some(mut glyph) = Pixmap::new(image.placement.width, image.placement.height) else {
        return;
    };
    let Rgba { rgb, alpha } = color;
    for (pixel, coverage) in glyph.pixels_mut().iter_mut().zip(&image.data) {
        let a = (*coverage as f32 * alpha).round().clamp(0.0, 255.0) as u8;
        *pixel = ColorU8::from_rgba(rgb.r, rgb.g, rgb.b, a).premultiply();
    }
    canvas.draw_pixmap(
        x + image.placement.left,
        baseline - image.placement.top,
        glyph.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        clip,
    );
}

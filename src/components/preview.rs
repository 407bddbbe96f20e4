//! Glass Card Preview
//!
//! Live rendering of the card: frame, blurred backdrop, tint, border,
//! window dots and the post-processed content. The same composited style
//! drives the rasterizer, so exports match what is shown here.

use dioxus::prelude::*;
use markframe_core::style::compositor::{
    FRAME_INSET, FRAME_RADIUS, WINDOW_DOTS, WINDOW_DOT_GAP, WINDOW_DOT_OFFSET, WINDOW_DOT_OPACITY, WINDOW_DOT_SIZE,
};
use markframe_core::{compose, ThemeMode};

use crate::components::CanvasHandle;
use crate::context::use_editor_state;

/// The card at its current canvas size
#[component]
pub fn Preview() -> Element {
    let mut state = use_editor_state();
    let composed = compose(&state.style.read());
    let geometry = state.canvas.read().current();
    let (width, height) = geometry.pixel_size();
    let html = state.html.read().clone();

    let frame_css = composed.frame_css();
    let blur_css = composed.blur_layer_css();
    let tint = composed.tint.css();
    let border = composed.border_css();
    let radius = composed.radius;
    let padding = composed.padding;
    let text_color = composed.text_color;
    let font = composed.font.clone();
    let font_size = composed.font_size_px;
    let theme_class = match composed.theme {
        ThemeMode::Light => "card-content card-content--light",
        ThemeMode::Dark => "card-content card-content--dark",
    };

    rsx! {
        div { class: "stage",
            div {
                class: "frame",
                style: "width: {width}px; min-height: {height}px; border-radius: {FRAME_RADIUS}px; padding: {FRAME_INSET}px;",
                onmounted: move |event| state.frame.set(Some(event.data())),

                // Backdrop sits beside the card so its filter never reaches the card
                div {
                    class: "frame__backdrop",
                    style: "{frame_css} border-radius: {FRAME_RADIUS}px;",
                }

                div {
                    class: "card",
                    style: "border-radius: {radius}px; border: {border};",

                    div { class: "card__layer", style: "{blur_css} border-radius: {radius}px;" }
                    div { class: "card__layer", style: "background: {tint}; border-radius: {radius}px;" }

                    div {
                        class: "card__dots",
                        style: "top: {WINDOW_DOT_OFFSET}px; left: {WINDOW_DOT_OFFSET}px; gap: {WINDOW_DOT_GAP}px; opacity: {WINDOW_DOT_OPACITY};",
                        for color in WINDOW_DOTS.iter() {
                            span {
                                class: "card__dot",
                                style: "width: {WINDOW_DOT_SIZE}px; height: {WINDOW_DOT_SIZE}px; background: {color};",
                            }
                        }
                    }

                    div {
                        class: "{theme_class}",
                        style: "padding: {padding}px; padding-top: calc({padding}px + {WINDOW_DOT_OFFSET}px); color: {text_color}; font-family: '{font}', sans-serif; font-size: {font_size}px;",
                        dangerous_inner_html: "{html}",
                    }
                }

                div { class: "frame__watermark", "MarkFrame" }
                CanvasHandle {}
            }
            div { class: "stage__size", "{width} × {height}" }
        }
    }
}

//! Style Panel
//!
//! Background, glass and typography controls. Every control is a plain
//! setter on the shared `StyleConfig`; clamping happens in the core.

use dioxus::prelude::*;
use markframe_core::style::{
    GradientDirection, Rgb, ThemeMode, BLUR_RANGE, BRIGHTNESS_RANGE, FONTS, OPACITY_RANGE, PADDING_RANGE,
    PRESET_GRADIENTS, RADIUS_RANGE, TEXT_PRESETS,
};
use markframe_core::upload::{read_image_data_url, IMAGE_EXTENSIONS};
use markframe_core::Background;
use rfd::FileDialog;

use crate::context::use_editor_state;

const DIRECTIONS: [(&str, &str); 5] = [
    ("135deg", "Diagonal"),
    ("to right", "Horizontal"),
    ("to bottom", "Vertical"),
    ("to top", "Upward"),
    ("to left", "Leftward"),
];

#[derive(Clone, Copy, PartialEq)]
enum BackgroundTab {
    Presets,
    Custom,
    Image,
}

/// Labelled range input
#[component]
fn Slider(
    label: &'static str,
    value: u32,
    range: (u32, u32),
    #[props(default = "px")] unit: &'static str,
    on_change: EventHandler<u32>,
) -> Element {
    rsx! {
        label { class: "slider",
            div { class: "slider__row",
                span { class: "slider__label", "{label}" }
                span { class: "slider__value", "{value}{unit}" }
            }
            input {
                r#type: "range",
                min: "{range.0}",
                max: "{range.1}",
                value: "{value}",
                oninput: move |e| {
                    if let Ok(v) = e.value().parse::<u32>() {
                        on_change.call(v);
                    }
                },
            }
        }
    }
}

/// All style controls for the card
#[component]
pub fn StylePanel() -> Element {
    let state = use_editor_state();
    let mut style = state.style;
    let mut tab = use_signal(|| BackgroundTab::Presets);
    let mut upload_error = use_signal(|| Option::<String>::None);
    let mut custom_start = use_signal(|| Rgb::hex(0xffe4e6));
    let mut custom_end = use_signal(|| Rgb::hex(0xdbeafe));
    let mut custom_direction = use_signal(GradientDirection::default);

    let current = style.read().clone();

    let mut apply_custom = move || {
        style.write().set_background(Background::CustomGradient {
            start: custom_start(),
            end: custom_end(),
            direction: custom_direction(),
        });
    };

    // Each pick re-reads the file, so the same path twice is accepted
    let pick_image = move |_| {
        upload_error.set(None);
        spawn(async move {
            let file_path = tokio::task::spawn_blocking(move || {
                FileDialog::new()
                    .add_filter("images", IMAGE_EXTENSIONS)
                    .set_title("Select Background Image")
                    .pick_file()
            })
            .await;

            match file_path {
                Ok(Some(path)) => match tokio::task::spawn_blocking(move || read_image_data_url(&path)).await {
                    Ok(Ok(data_url)) => {
                        style.write().set_background(Background::Image {
                            data_url,
                            brightness: 100,
                        });
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Failed to load background image: {}", e);
                        upload_error.set(Some(format!("Could not load image: {}", e)));
                    }
                    Err(e) => upload_error.set(Some(format!("Image loader error: {:?}", e))),
                },
                Ok(None) => {
                    // User cancelled
                }
                Err(e) => upload_error.set(Some(format!("File picker error: {:?}", e))),
            }
        });
    };

    let selected_preset = match &current.background {
        Background::Gradient { preset } => Some(preset.clone()),
        _ => None,
    };
    let image_brightness = match &current.background {
        Background::Image { brightness, .. } => Some(*brightness),
        _ => None,
    };

    rsx! {
        section { class: "panel style-panel",
            div { class: "panel__header",
                span { class: "panel__title", "Background" }
            }

            div { class: "tabs",
                button {
                    class: if tab() == BackgroundTab::Presets { "tab tab--active" } else { "tab" },
                    onclick: move |_| tab.set(BackgroundTab::Presets),
                    "Presets"
                }
                button {
                    class: if tab() == BackgroundTab::Custom { "tab tab--active" } else { "tab" },
                    onclick: move |_| tab.set(BackgroundTab::Custom),
                    "Custom"
                }
                button {
                    class: if tab() == BackgroundTab::Image { "tab tab--active" } else { "tab" },
                    onclick: move |_| tab.set(BackgroundTab::Image),
                    "Image"
                }
            }

            {
                match tab() {
                    BackgroundTab::Presets => rsx! {
                        div { class: "swatch-grid",
                            for preset in PRESET_GRADIENTS.iter() {
                                button {
                                    key: "{preset.name}",
                                    class: if selected_preset.as_deref() == Some(preset.name) { "swatch swatch--active" } else { "swatch" },
                                    title: "{preset.name}",
                                    style: "background: {preset.css()}",
                                    onclick: move |_| {
                                        style.write().set_background(Background::Gradient {
                                            preset: preset.name.to_string(),
                                        });
                                    },
                                }
                            }
                        }
                    },
                    BackgroundTab::Custom => rsx! {
                        div { class: "custom-gradient",
                            label { class: "color-field",
                                span { "Start" }
                                input {
                                    r#type: "color",
                                    value: "{custom_start}",
                                    oninput: move |e| {
                                        if let Ok(color) = e.value().parse::<Rgb>() {
                                            custom_start.set(color);
                                            apply_custom();
                                        }
                                    },
                                }
                            }
                            label { class: "color-field",
                                span { "End" }
                                input {
                                    r#type: "color",
                                    value: "{custom_end}",
                                    oninput: move |e| {
                                        if let Ok(color) = e.value().parse::<Rgb>() {
                                            custom_end.set(color);
                                            apply_custom();
                                        }
                                    },
                                }
                            }
                            select {
                                class: "select",
                                onchange: move |e| {
                                    if let Ok(direction) = e.value().parse::<GradientDirection>() {
                                        custom_direction.set(direction);
                                        apply_custom();
                                    }
                                },
                                for (value, label) in DIRECTIONS {
                                    option {
                                        value: "{value}",
                                        selected: custom_direction().css() == value,
                                        "{label}"
                                    }
                                }
                            }
                        }
                    },
                    BackgroundTab::Image => rsx! {
                        div { class: "image-upload",
                            button { class: "image-upload-btn", onclick: pick_image, "Upload Image" }
                            if let Some(err) = upload_error() {
                                div { class: "image-upload__error", "{err}" }
                            }
                            if let Some(brightness) = image_brightness {
                                Slider {
                                    label: "Brightness",
                                    value: brightness,
                                    range: BRIGHTNESS_RANGE,
                                    unit: "%",
                                    on_change: move |v| style.write().set_brightness(v),
                                }
                            }
                        }
                    },
                }
            }

            div { class: "panel__header",
                span { class: "panel__title", "Glass" }
            }
            Slider {
                label: "Blur",
                value: current.blur,
                range: BLUR_RANGE,
                on_change: move |v| style.write().set_blur(v),
            }
            Slider {
                label: "Opacity",
                value: current.opacity,
                range: OPACITY_RANGE,
                unit: "%",
                on_change: move |v| style.write().set_opacity(v),
            }
            Slider {
                label: "Padding",
                value: current.padding,
                range: PADDING_RANGE,
                on_change: move |v| style.write().set_padding(v),
            }
            Slider {
                label: "Radius",
                value: current.radius,
                range: RADIUS_RANGE,
                on_change: move |v| style.write().set_radius(v),
            }
            div { class: "theme-toggle",
                button {
                    class: if current.theme == ThemeMode::Light { "tab tab--active" } else { "tab" },
                    onclick: move |_| style.write().set_theme(ThemeMode::Light),
                    "Light"
                }
                button {
                    class: if current.theme == ThemeMode::Dark { "tab tab--active" } else { "tab" },
                    onclick: move |_| style.write().set_theme(ThemeMode::Dark),
                    "Dark"
                }
            }

            div { class: "panel__header",
                span { class: "panel__title", "Typography" }
            }
            div { class: "font-grid",
                for font in FONTS.iter() {
                    button {
                        key: "{font.label}",
                        class: if current.typography.font == font.family { "font-btn font-btn--active" } else { "font-btn" },
                        style: "font-family: '{font.family}'",
                        onclick: move |_| style.write().typography.font = font.family.to_string(),
                        "{font.label}"
                    }
                }
            }
            div { class: "swatch-row",
                for preset in TEXT_PRESETS.iter() {
                    button {
                        key: "{preset.name}",
                        class: if current.typography.color == preset.color { "dot dot--active" } else { "dot" },
                        title: "{preset.name}",
                        style: "background: {preset.color}",
                        onclick: move |_| style.write().apply_text_preset(preset),
                    }
                }
            }
        }
    }
}

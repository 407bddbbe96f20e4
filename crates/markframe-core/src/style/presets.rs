//! Static catalogs: fonts, text colors and preset gradients.

use super::{Gradient, GradientDirection, GradientStop, Rgb, ThemeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontPreset {
    pub family: &'static str,
    pub label: &'static str,
}

pub static FONTS: [FontPreset; 6] = [
    FontPreset {
        family: "Inter",
        label: "Modern",
    },
    FontPreset {
        family: "Playfair Display",
        label: "Elegant",
    },
    FontPreset {
        family: "JetBrains Mono",
        label: "Code",
    },
    FontPreset {
        family: "Roboto",
        label: "Clean",
    },
    FontPreset {
        family: "Poppins",
        label: "Geometric",
    },
    FontPreset {
        family: "Lora",
        label: "Serif",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPreset {
    pub name: &'static str,
    pub color: Rgb,
    /// Light text meant for dark cards
    pub light: bool,
}

impl TextPreset {
    const fn dark_text(name: &'static str, hex: u32) -> Self {
        Self {
            name,
            color: Rgb::hex(hex),
            light: false,
        }
    }

    const fn light_text(name: &'static str, hex: u32) -> Self {
        Self {
            name,
            color: Rgb::hex(hex),
            light: true,
        }
    }

    /// Card theme that goes with this text color.
    pub fn theme_mode(&self) -> ThemeMode {
        if self.light {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }
}

pub static TEXT_PRESETS: [TextPreset; 9] = [
    TextPreset::dark_text("Deep Slate", 0x1e293b),
    TextPreset::dark_text("Midnight", 0x172554),
    TextPreset::dark_text("Charcoal", 0x334155),
    TextPreset::dark_text("Forest", 0x064e3b),
    TextPreset::dark_text("Maroon", 0x881337),
    TextPreset::dark_text("Chocolate", 0x451a03),
    TextPreset::light_text("Pure White", 0xffffff),
    TextPreset::light_text("Soft Gray", 0xf1f5f9),
    TextPreset::light_text("Cream", 0xfefce8),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetGradient {
    pub name: &'static str,
    pub direction: GradientDirection,
    pub stops: &'static [GradientStop],
}

impl PresetGradient {
    pub fn gradient(&self) -> Gradient {
        Gradient {
            direction: self.direction,
            stops: self.stops.to_vec(),
        }
    }

    pub fn css(&self) -> String {
        self.gradient().css()
    }
}

const fn stop(hex: u32, position: f32) -> GradientStop {
    GradientStop::at(Rgb::hex(hex), position)
}

pub static PRESET_GRADIENTS: [PresetGradient; 8] = [
    PresetGradient {
        name: "Apple Mesh",
        direction: GradientDirection::Angle(135.0),
        stops: &[stop(0xffe4e6, 0.0), stop(0xe9d5ff, 50.0), stop(0xdbeafe, 100.0)],
    },
    PresetGradient {
        name: "Soft Air",
        direction: GradientDirection::Angle(135.0),
        stops: &[stop(0xeef2ff, 0.0), stop(0xf5f3ff, 100.0)],
    },
    PresetGradient {
        name: "Nordic",
        direction: GradientDirection::ToRight,
        stops: &[stop(0xd4fc79, 0.0), stop(0x96e6a1, 100.0)],
    },
    PresetGradient {
        name: "Sunset",
        direction: GradientDirection::ToTop,
        stops: &[stop(0xfdcbf1, 0.0), stop(0xe6dee9, 100.0)],
    },
    PresetGradient {
        name: "Oceanic",
        direction: GradientDirection::Angle(225.0),
        stops: &[stop(0x60a5fa, 0.0), stop(0x5eead4, 50.0), stop(0x34d399, 100.0)],
    },
    PresetGradient {
        name: "Midnight",
        direction: GradientDirection::Angle(135.0),
        stops: &[stop(0x0f172a, 0.0), stop(0x3b0764, 50.0), stop(0x0f172a, 100.0)],
    },
    PresetGradient {
        name: "Deep Space",
        direction: GradientDirection::ToTop,
        stops: &[stop(0x09203f, 0.0), stop(0x537895, 100.0)],
    },
    PresetGradient {
        name: "Clean",
        direction: GradientDirection::ToBottom,
        stops: &[
            GradientStop::auto(Rgb::hex(0xf9fafb)),
            GradientStop::auto(Rgb::hex(0xf3f4f6)),
        ],
    },
];

/// Case-insensitive lookup by name.
pub fn gradient_by_name(name: &str) -> Option<&'static PresetGradient> {
    PRESET_GRADIENTS
        .iter()
        .find(|g| g.name.eq_ignore_ascii_case(name.trim()))
}

pub fn text_preset_by_name(name: &str) -> Option<&'static TextPreset> {
    TEXT_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

pub fn font_by_label(label: &str) -> Option<&'static FontPreset> {
    FONTS
        .iter()
        .find(|f| f.label.eq_ignore_ascii_case(label.trim()) || f.family.eq_ignore_ascii_case(label.trim()))
}

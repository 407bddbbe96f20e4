//! Card styling: the user-facing [`StyleConfig`] and its building blocks.

pub mod compositor;
pub mod presets;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarkframeError;

pub use compositor::{compose, BackdropPaint, CompositedStyle, Rgba};
pub use presets::{FontPreset, PresetGradient, TextPreset, FONTS, PRESET_GRADIENTS, TEXT_PRESETS};

pub const BLUR_RANGE: (u32, u32) = (0, 60);
pub const OPACITY_RANGE: (u32, u32) = (0, 100);
pub const PADDING_RANGE: (u32, u32) = (16, 128);
pub const RADIUS_RANGE: (u32, u32) = (0, 48);
pub const BRIGHTNESS_RANGE: (u32, u32) = (0, 200);

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }

    /// Linear interpolation, `t` in `0..=1`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MarkframeError;

    /// Accepts `#rrggbb` and `#rgb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MarkframeError::Config(format!("invalid color: {s:?}"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(invalid()),
        };
        let value = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
        Ok(Rgb::hex(value))
    }
}

impl TryFrom<String> for Rgb {
    type Error = MarkframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Direction of a linear gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GradientDirection {
    ToRight,
    ToBottom,
    ToTop,
    ToLeft,
    /// CSS angle; 0 points up, 90 points right
    Angle(f32),
}

impl GradientDirection {
    pub fn css(&self) -> String {
        match self {
            GradientDirection::ToRight => "to right".into(),
            GradientDirection::ToBottom => "to bottom".into(),
            GradientDirection::ToTop => "to top".into(),
            GradientDirection::ToLeft => "to left".into(),
            GradientDirection::Angle(deg) => format!("{deg}deg"),
        }
    }

    /// Equivalent CSS angle in degrees.
    pub fn angle_deg(&self) -> f32 {
        match self {
            GradientDirection::ToTop => 0.0,
            GradientDirection::ToRight => 90.0,
            GradientDirection::ToBottom => 180.0,
            GradientDirection::ToLeft => 270.0,
            GradientDirection::Angle(deg) => *deg,
        }
    }
}

impl Default for GradientDirection {
    fn default() -> Self {
        GradientDirection::Angle(135.0)
    }
}

impl FromStr for GradientDirection {
    type Err = MarkframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "to right" => Ok(GradientDirection::ToRight),
            "to bottom" => Ok(GradientDirection::ToBottom),
            "to top" => Ok(GradientDirection::ToTop),
            "to left" => Ok(GradientDirection::ToLeft),
            other => other
                .strip_suffix("deg")
                .and_then(|n| n.trim().parse::<f32>().ok())
                .filter(|n| n.is_finite())
                .map(GradientDirection::Angle)
                .ok_or_else(|| MarkframeError::Config(format!("invalid gradient direction: {s:?}"))),
        }
    }
}

impl TryFrom<String> for GradientDirection {
    type Error = MarkframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GradientDirection> for String {
    fn from(value: GradientDirection) -> Self {
        value.css()
    }
}

/// One color stop; `position` is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Rgb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f32>,
}

impl GradientStop {
    pub const fn at(color: Rgb, position: f32) -> Self {
        Self {
            color,
            position: Some(position),
        }
    }

    pub const fn auto(color: Rgb) -> Self {
        Self { color, position: None }
    }
}

/// A linear gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub direction: GradientDirection,
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn css(&self) -> String {
        let stops: Vec<String> = self
            .stops
            .iter()
            .map(|stop| match stop.position {
                Some(p) => format!("{} {}%", stop.color, p),
                None => stop.color.to_string(),
            })
            .collect();
        format!("linear-gradient({}, {})", self.direction.css(), stops.join(", "))
    }

    /// Stops with every position resolved, CSS style: missing ends become
    /// 0 and 100, missing middles are spread evenly between neighbours.
    pub fn resolved_stops(&self) -> Vec<(f32, Rgb)> {
        let n = self.stops.len();
        let mut positions: Vec<Option<f32>> = self.stops.iter().map(|s| s.position).collect();
        if n == 0 {
            return Vec::new();
        }
        if positions[0].is_none() {
            positions[0] = Some(0.0);
        }
        if positions[n - 1].is_none() {
            positions[n - 1] = Some(100.0);
        }
        let mut i = 0;
        while i < n {
            if positions[i].is_some() {
                i += 1;
                continue;
            }
            let start = i - 1;
            let mut end = i;
            while positions[end].is_none() {
                end += 1;
            }
            let (a, b) = (positions[start].unwrap_or(0.0), positions[end].unwrap_or(100.0));
            for (k, slot) in positions.iter_mut().enumerate().take(end).skip(start + 1) {
                *slot = Some(a + (b - a) * (k - start) as f32 / (end - start) as f32);
            }
            i = end;
        }
        // Positions never decrease
        let mut last = f32::MIN;
        self.stops
            .iter()
            .zip(positions)
            .map(|(stop, p)| {
                let p = p.unwrap_or(0.0).max(last);
                last = p;
                (p, stop.color)
            })
            .collect()
    }
}

/// The card backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Background {
    /// One of [`PRESET_GRADIENTS`], by name
    Gradient { preset: String },
    CustomGradient {
        start: Rgb,
        end: Rgb,
        #[serde(default)]
        direction: GradientDirection,
    },
    Image {
        data_url: String,
        /// Percent, 100 is unchanged
        #[serde(default = "default_brightness")]
        brightness: u32,
    },
}

fn default_brightness() -> u32 {
    100
}

impl Default for Background {
    fn default() -> Self {
        Background::Gradient {
            preset: PRESET_GRADIENTS[0].name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl FromStr for ThemeMode {
    type Err = MarkframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(MarkframeError::Config(format!("invalid theme: {s:?}"))),
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

/// Text styling of the card content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    /// CSS font family name, see [`FONTS`]
    pub font: String,
    pub size_px: u32,
    pub color: Rgb,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font: FONTS[0].family.to_string(),
            size_px: 16,
            color: TEXT_PRESETS[0].color,
        }
    }
}

/// Everything the user can tune about the card.
///
/// Numeric fields are clamped by the setters and by [`normalized`]; a
/// config loaded from JSON should go through `normalized` before use.
///
/// [`normalized`]: StyleConfig::normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub background: Background,
    /// Backdrop blur, px
    pub blur: u32,
    /// Tint opacity, percent
    pub opacity: u32,
    /// Card padding, px
    pub padding: u32,
    /// Card corner radius, px
    pub radius: u32,
    pub theme: ThemeMode,
    pub typography: Typography,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background: Background::default(),
            blur: 40,
            opacity: 60,
            padding: 64,
            radius: 24,
            theme: ThemeMode::Light,
            typography: Typography::default(),
        }
    }
}

fn clamp(value: u32, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo, hi)
}

impl StyleConfig {
    pub fn set_blur(&mut self, px: u32) {
        self.blur = clamp(px, BLUR_RANGE);
    }

    pub fn set_opacity(&mut self, percent: u32) {
        self.opacity = clamp(percent, OPACITY_RANGE);
    }

    pub fn set_padding(&mut self, px: u32) {
        self.padding = clamp(px, PADDING_RANGE);
    }

    pub fn set_radius(&mut self, px: u32) {
        self.radius = clamp(px, RADIUS_RANGE);
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.theme = theme;
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = match background {
            Background::Image { data_url, brightness } => Background::Image {
                data_url,
                brightness: clamp(brightness, BRIGHTNESS_RANGE),
            },
            other => other,
        };
    }

    /// Change only the brightness of an image background.
    pub fn set_brightness(&mut self, percent: u32) {
        if let Background::Image { brightness, .. } = &mut self.background {
            *brightness = clamp(percent, BRIGHTNESS_RANGE);
        }
    }

    /// Apply a text color preset; light text flips the card to dark mode.
    pub fn apply_text_preset(&mut self, preset: &TextPreset) {
        self.typography.color = preset.color;
        self.theme = preset.theme_mode();
    }

    /// Copy with every numeric field clamped into range.
    pub fn normalized(mut self) -> Self {
        self.set_blur(self.blur);
        self.set_opacity(self.opacity);
        self.set_padding(self.padding);
        self.set_radius(self.radius);
        let background = std::mem::take(&mut self.background);
        self.set_background(background);
        self
    }

    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, MarkframeError> {
        let config: StyleConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = StyleConfig::default();
        assert_eq!(style.blur, 40);
        assert_eq!(style.opacity, 60);
        assert_eq!(style.padding, 64);
        assert_eq!(style.radius, 24);
        assert_eq!(style.theme, ThemeMode::Light);
        assert_eq!(
            style.background,
            Background::Gradient {
                preset: "Apple Mesh".into()
            }
        );
    }

    #[test]
    fn test_setters_clamp() {
        let mut style = StyleConfig::default();
        style.set_blur(500);
        style.set_opacity(101);
        style.set_padding(0);
        style.set_radius(49);
        assert_eq!((style.blur, style.opacity, style.padding, style.radius), (60, 100, 16, 48));
    }

    #[test]
    fn test_brightness_only_applies_to_images() {
        let mut style = StyleConfig::default();
        style.set_brightness(150);
        assert!(matches!(style.background, Background::Gradient { .. }));

        style.set_background(Background::Image {
            data_url: "data:image/png;base64,AA==".into(),
            brightness: 900,
        });
        assert!(matches!(style.background, Background::Image { brightness: 200, .. }));
        style.set_brightness(50);
        assert!(matches!(style.background, Background::Image { brightness: 50, .. }));
    }

    #[test]
    fn test_rgb_parse_and_display() {
        assert_eq!("#1e293b".parse::<Rgb>().unwrap(), Rgb::hex(0x1e293b));
        assert_eq!("#fff".parse::<Rgb>().unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(Rgb::hex(0x0f172a).to_string(), "#0f172a");
        assert!("1e293b".parse::<Rgb>().is_err());
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#gggggg".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_rgb_rejects_signed_hex() {
        assert!("#+12345".parse::<Rgb>().is_err());
        assert!("#-12345".parse::<Rgb>().is_err());
        assert!("#+ab".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("to right".parse::<GradientDirection>().unwrap(), GradientDirection::ToRight);
        assert_eq!(
            "45deg".parse::<GradientDirection>().unwrap(),
            GradientDirection::Angle(45.0)
        );
        assert!("sideways".parse::<GradientDirection>().is_err());
        assert_eq!(GradientDirection::Angle(135.0).css(), "135deg");
    }

    #[test]
    fn test_gradient_css() {
        let gradient = Gradient {
            direction: GradientDirection::ToBottom,
            stops: vec![
                GradientStop::auto(Rgb::hex(0xf9fafb)),
                GradientStop::auto(Rgb::hex(0xf3f4f6)),
            ],
        };
        assert_eq!(gradient.css(), "linear-gradient(to bottom, #f9fafb, #f3f4f6)");
    }

    #[test]
    fn test_resolved_stops_fill_gaps() {
        let gradient = Gradient {
            direction: GradientDirection::ToRight,
            stops: vec![
                GradientStop::auto(Rgb::hex(0x000000)),
                GradientStop::auto(Rgb::hex(0x808080)),
                GradientStop::auto(Rgb::hex(0xffffff)),
            ],
        };
        let positions: Vec<f32> = gradient.resolved_stops().iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_json_roundtrip_and_clamp() {
        let json = r##"{
            "background": {"type": "custom-gradient", "start": "#ff0000", "end": "#0000ff", "direction": "to right"},
            "blur": 99,
            "theme": "dark"
        }"##;
        let style = StyleConfig::from_json(json).unwrap();
        assert_eq!(style.blur, 60);
        assert_eq!(style.opacity, 60);
        assert_eq!(style.theme, ThemeMode::Dark);
        assert_eq!(
            style.background,
            Background::CustomGradient {
                start: Rgb::hex(0xff0000),
                end: Rgb::hex(0x0000ff),
                direction: GradientDirection::ToRight,
            }
        );

        let back = serde_json::to_string(&style).unwrap();
        assert!(back.contains("\"custom-gradient\""));
        assert_eq!(StyleConfig::from_json(&back).unwrap(), style);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = StyleConfig::from_json("{\"blur\": \"lots\"}").unwrap_err();
        assert!(matches!(err, MarkframeError::Config(_)));
    }
}

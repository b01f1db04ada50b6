use std::fmt;
use std::str::FromStr;

use palette::{Hsl, IntoColor, Srgb};
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// ChartColor – renderer-independent RGB
// ---------------------------------------------------------------------------

/// An sRGB colour carried in chart descriptions, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ChartColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (or `RRGGBB`), falling back to [`NEUTRAL`] on bad input.
    pub fn from_hex(hex: &str) -> Self {
        match Srgb::<u8>::from_str(hex) {
            Ok(c) => Self::rgb(c.red, c.green, c.blue),
            Err(_) => {
                log::warn!("Invalid colour {hex:?}, using neutral grey");
                NEUTRAL
            }
        }
    }
}

impl fmt::Display for ChartColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for ChartColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Used for keys the palette does not know about.
pub const NEUTRAL: ChartColor = ChartColor::rgb(0x78, 0x90, 0x9C);

/// Primary series colour (trend line, hover border).
pub const PRIMARY_HEX: &str = "#2E86AB";

/// Brand colours assigned to categories in order.
pub const BRAND_HEX: [&str; 6] = ["#2E86AB", "#A23B72", "#F18F01", "#4CAF50", "#FF9800", "#9C27B0"];

// ---------------------------------------------------------------------------
// Palette generation
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<ChartColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            ChartColor::rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// `n` colours for categorical series: the brand colours first, then
/// generated hues once those run out.
pub fn categorical(n: usize) -> Vec<ChartColor> {
    let mut colors: Vec<ChartColor> = BRAND_HEX
        .iter()
        .take(n)
        .map(|hex| ChartColor::from_hex(hex))
        .collect();
    if n > colors.len() {
        colors.extend(generate_palette(n - colors.len()));
    }
    colors
}

/// Colour for `key` given the full ordered key list, or [`NEUTRAL`] when
/// the key is not listed.
pub fn color_for_key(key: &str, all_keys: &[String], palette: &[ChartColor]) -> ChartColor {
    all_keys
        .iter()
        .position(|k| k == key)
        .and_then(|i| palette.get(i))
        .copied()
        .unwrap_or(NEUTRAL)
}

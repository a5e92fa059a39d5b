use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use volumen_dashboard::config::ChartPalette;

// ---------------------------------------------------------------------------
// Color palette generators
// ---------------------------------------------------------------------------

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

/// `n` shades of blue, darkest first.
pub fn blues(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl_to_color32(Hsl::new(210.0, 0.70, 0.35))],
        _ => (0..n)
            .map(|i| {
                let t = i as f32 / (n - 1) as f32;
                hsl_to_color32(Hsl::new(210.0, 0.70, 0.25 + 0.55 * t))
            })
            .collect(),
    }
}

/// `n` colours from the configured palette.
pub fn palette_colors(palette: ChartPalette, n: usize) -> Vec<Color32> {
    match palette {
        ChartPalette::Blues => blues(n),
        ChartPalette::Spectrum => generate_palette(n),
    }
}

/// Single colour used for the bar charts.
pub fn accent(palette: ChartPalette) -> Color32 {
    palette_colors(palette, 1)
        .first()
        .copied()
        .unwrap_or(Color32::LIGHT_BLUE)
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to colours, so a sector
/// keeps its colour while filters change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the column's distinct values.
    pub fn new<'a, I>(values: I, palette: ChartPalette) -> Self
    where
        I: ExactSizeIterator<Item = &'a String>,
    {
        let colors = palette_colors(palette, values.len());
        let mapping = values.cloned().zip(colors).collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_palette_sizes() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
        assert_eq!(blues(1).len(), 1);
        assert_eq!(blues(4).len(), 4);
    }

    #[test]
    fn test_blues_go_from_dark_to_light() {
        let shades = blues(3);
        let lum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(lum(shades[0]) < lum(shades[1]));
        assert!(lum(shades[1]) < lum(shades[2]));
    }

    #[test]
    fn test_color_map_is_stable_and_has_fallback() {
        let sectors: BTreeSet<String> = ["COMERCIAL", "INDUSTRIAL", "TRANSPORTE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = ColorMap::new(sectors.iter(), ChartPalette::Spectrum);
        let spectrum = generate_palette(3);
        assert_eq!(map.color_for("COMERCIAL"), spectrum[0]);
        assert_eq!(map.color_for("TRANSPORTE"), spectrum[2]);
        assert_eq!(map.color_for("OTRO"), Color32::GRAY);
    }
}

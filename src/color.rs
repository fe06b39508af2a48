use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::name_key;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: amphora name → Color32
// ---------------------------------------------------------------------------

/// Assigns each amphora type a stable colour, shared by the plot series and
/// the checklist swatches. Keyed case-insensitively like all name lookups.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    pub fn new(names: &[String]) -> Self {
        let palette = generate_palette(names.len());
        ColorMap {
            mapping: names
                .iter()
                .zip(palette)
                .map(|(name, color)| (name_key(name), color))
                .collect(),
        }
    }

    pub fn color_for(&self, name: &str) -> Color32 {
        self.mapping
            .get(&name_key(name))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let map = ColorMap::new(&["Dressel_20".to_string(), "Bozburun".to_string()]);
        assert_eq!(map.color_for("dressel_20"), map.color_for("Dressel_20"));
        assert_ne!(map.color_for("Dressel_20"), map.color_for("Bozburun"));
        assert_eq!(map.color_for("unknown"), Color32::GRAY);
    }
}

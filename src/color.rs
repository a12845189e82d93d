use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellValue;

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// `n` visually distinct colours with evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| hsl_to_color32((i as f32 / n as f32) * 360.0, 0.75, 0.55))
        .collect()
}

/// Diverging background for a correlation coefficient: blue for positive,
/// red for negative, fading to grey around zero.
pub fn correlation_color(r: Option<f64>) -> Color32 {
    let Some(r) = r else {
        return Color32::from_gray(60);
    };
    let strength = r.abs().clamp(0.0, 1.0) as f32;
    let hue = if r >= 0.0 { 215.0 } else { 5.0 };
    hsl_to_color32(hue, 0.15 + 0.6 * strength, 0.28 + 0.12 * strength)
}

/// Maps the classes of a target column to distinct colours.
#[derive(Debug, Clone)]
pub struct ClassColors {
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ClassColors {
    pub fn new(classes: &BTreeSet<CellValue>) -> Self {
        let mapping = classes
            .iter()
            .cloned()
            .zip(generate_palette(classes.len()))
            .collect();
        ClassColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping.get(value).copied().unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[1]);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_class_colors() {
        let classes: BTreeSet<CellValue> =
            [CellValue::String("no".into()), CellValue::String("yes".into())].into();
        let colors = ClassColors::new(&classes);
        assert_ne!(
            colors.color_for(&CellValue::String("no".into())),
            colors.color_for(&CellValue::String("yes".into()))
        );
        assert_eq!(colors.color_for(&CellValue::Null), Color32::GRAY);
    }

    #[test]
    fn test_correlation_sign_changes_hue() {
        assert_ne!(correlation_color(Some(0.9)), correlation_color(Some(-0.9)));
    }
}

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Scatter colours
// ---------------------------------------------------------------------------

/// Hue for events both classifiers label the same.
const AGREE_HUE: f32 = 140.0;
/// Hue for events the classifiers disagree on.
const DISAGREE_HUE: f32 = 28.0;

pub fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let hsl = Hsl::new(hue, saturation, lightness);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Marker colour: highlighted when the two labels agree.
pub fn agreement_color(highlighted: bool) -> Color32 {
    if highlighted {
        hsl_color(AGREE_HUE, 0.75, 0.5)
    } else {
        hsl_color(DISAGREE_HUE, 0.85, 0.55)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues_convert() {
        let red = hsl_color(0.0, 1.0, 0.5);
        assert!(red.r() >= 254 && red.g() <= 1 && red.b() <= 1);
        let blue = hsl_color(240.0, 1.0, 0.5);
        assert!(blue.b() >= 254 && blue.r() <= 1 && blue.g() <= 1);
    }

    #[test]
    fn highlight_differs_from_default() {
        assert_ne!(agreement_color(true), agreement_color(false));
        let agree = agreement_color(true);
        assert!(agree.g() > agree.r());
    }
}

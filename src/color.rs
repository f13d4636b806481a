use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Series colours
// ---------------------------------------------------------------------------

pub const DENSITY: Color32 = Color32::from_rgb(0, 128, 0);
pub const TEMPERATURE: Color32 = Color32::from_rgb(255, 0, 0);
pub const VELOCITY: Color32 = Color32::from_rgb(0, 0, 255);
pub const INTEGRATED_FLUX: Color32 = Color32::from_rgb(0, 0, 139);

// ---------------------------------------------------------------------------
// Colour map: scalar → Color32
// ---------------------------------------------------------------------------

/// Evenly spaced samples of matplotlib's `inferno`.
const INFERNO_STOPS: [(u8, u8, u8); 9] = [
    (0x00, 0x00, 0x04),
    (0x1b, 0x0c, 0x41),
    (0x4a, 0x0c, 0x6b),
    (0x78, 0x1c, 0x6d),
    (0xa5, 0x2c, 0x60),
    (0xcf, 0x44, 0x46),
    (0xed, 0x69, 0x25),
    (0xfb, 0x9b, 0x06),
    (0xfc, 0xff, 0xa4),
];

const LUT_SIZE: usize = 256;

/// A perceptual colour map over `[min, max]`, sampled into a lookup table.
#[derive(Debug, Clone)]
pub struct ColorMap {
    lut: Vec<Color32>,
    min: f64,
    max: f64,
}

impl ColorMap {
    /// Inferno map over the given value range.
    pub fn inferno(min: f64, max: f64) -> Self {
        let stops: Vec<LinSrgb> = INFERNO_STOPS
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b).into_format::<f32>().into_linear())
            .collect();
        let segments = (stops.len() - 1) as f32;
        let lut = (0..LUT_SIZE)
            .map(|i| {
                let t = i as f32 / (LUT_SIZE - 1) as f32 * segments;
                let lo = (t.floor() as usize).min(stops.len() - 2);
                let mixed = stops[lo].mix(stops[lo + 1], t - lo as f32);
                let rgb: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
                Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
            })
            .collect();
        ColorMap { lut, min, max }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Colour for a value; non-finite values are transparent.
    pub fn color_for(&self, value: f64) -> Color32 {
        if !value.is_finite() {
            return Color32::TRANSPARENT;
        }
        self.lut[self.index(value)]
    }

    /// Colour at fraction `t` of the way from min to max.
    pub fn color_at(&self, t: f64) -> Color32 {
        self.color_for(self.min + t.clamp(0.0, 1.0) * (self.max - self.min))
    }

    fn index(&self, value: f64) -> usize {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.5 };
        (t.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_inferno() {
        let cm = ColorMap::inferno(-10.0, 10.0);
        assert_eq!(cm.color_for(-10.0), Color32::from_rgb(0x00, 0x00, 0x04));
        assert_eq!(cm.color_for(10.0), Color32::from_rgb(0xfc, 0xff, 0xa4));
        // Out-of-range values clamp.
        assert_eq!(cm.color_for(99.0), cm.color_for(10.0));
    }

    #[test]
    fn missing_values_are_transparent() {
        let cm = ColorMap::inferno(0.0, 1.0);
        assert_eq!(cm.color_for(f64::NAN), Color32::TRANSPARENT);
        assert_eq!(cm.color_for(f64::NEG_INFINITY), Color32::TRANSPARENT);
    }

    #[test]
    fn flat_range_uses_middle_colour() {
        let cm = ColorMap::inferno(3.0, 3.0);
        assert_eq!(cm.color_for(3.0), cm.color_at(0.5));
    }
}

//! Color space conversions on the 8-bit scales used by the thresholds
//!
//! Hue is stored as degrees / 2 (0..=179) so that a full byte range holds
//! saturation and value, and Lab lightness is scaled to 0..=255.

use image::Rgb;
use palette::{FromColor, Lab, Srgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> Hsv {
    let hsv: palette::Hsv = palette::Hsv::from_color(to_srgb(pixel));
    let hue = hsv.hue.into_positive_degrees();

    Hsv {
        h: ((hue / 2.0).round() as u32 % 180) as u8,
        s: (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8,
        v: (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8,
    }
}

/// Inclusive HSV box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        (self.lower[0]..=self.upper[0]).contains(&hsv.h)
            && (self.lower[1]..=self.upper[1]).contains(&hsv.s)
            && (self.lower[2]..=self.upper[2]).contains(&hsv.v)
    }
}

fn to_srgb(pixel: &Rgb<u8>) -> Srgb {
    let [r, g, b] = pixel.0;
    Srgb::new(r, g, b).into_format()
}

/// CIE L* of an sRGB pixel scaled to 0..=255
pub fn lab_lightness(pixel: &Rgb<u8>) -> u8 {
    let lab: Lab = Lab::from_color(to_srgb(pixel).into_linear());
    (lab.l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), Hsv { h: 120, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(&Rgb([128, 128, 128])), Hsv { h: 0, s: 0, v: 128 });
    }

    #[test]
    fn test_hsv_range() {
        let blue = HsvRange::new([90, 80, 50], [135, 255, 255]);
        assert!(blue.contains(&rgb_to_hsv(&Rgb([20, 60, 200]))));
        assert!(!blue.contains(&rgb_to_hsv(&Rgb([200, 60, 20]))));
    }

    #[test]
    fn test_lightness_extremes() {
        assert_eq!(lab_lightness(&Rgb([0, 0, 0])), 0);
        assert_eq!(lab_lightness(&Rgb([255, 255, 255])), 255);
        let dark = lab_lightness(&Rgb([100, 100, 100]));
        let light = lab_lightness(&Rgb([130, 130, 130]));
        assert!(dark < light);
    }
}

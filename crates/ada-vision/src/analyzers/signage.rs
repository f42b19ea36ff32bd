//! Sign checks: luminance contrast and tactile texture

use ada_types::{round_to, Severity, ViolationRecord};
use image::{GrayImage, RgbImage};
use tracing::debug;

use super::{CategoryAnalyzer, DetectionContext};
use crate::imaging::{is_empty_region, lab_lightness, to_gray};

#[derive(Debug, Clone, PartialEq)]
pub struct SignageParams {
    pub min_contrast_ratio: f64,
    /// Below this the contrast finding is Critical
    pub low_contrast_ratio: f64,
    pub patch_size: u32,
    /// Mean patch standard deviation below which a surface reads as smooth
    pub min_texture: f64,
    pub max_texture_peak: f64,
}

impl Default for SignageParams {
    fn default() -> Self {
        Self {
            min_contrast_ratio: 3.0,
            low_contrast_ratio: 2.5,
            patch_size: 20,
            min_texture: 15.0,
            max_texture_peak: 25.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct SignageAnalyzer {
    params: SignageParams,
}

impl SignageAnalyzer {
    pub fn new(params: SignageParams) -> Self {
        Self { params }
    }

    fn check_contrast(&self, region: &RgbImage) -> Option<ViolationRecord> {
        let p = &self.params;
        let (min_l, max_l) = region
            .pixels()
            .map(lab_lightness)
            .fold((u8::MAX, u8::MIN), |(lo, hi), l| (lo.min(l), hi.max(l)));

        let ratio = contrast_ratio(max_l, min_l);
        debug!(ratio, "sign contrast ratio");

        let (severity, confidence, qualifier, margin) = if ratio < p.low_contrast_ratio {
            (Severity::Critical, 0.70, "Very low contrast ratio", "well below")
        } else if ratio < p.min_contrast_ratio {
            (Severity::Moderate, 0.65, "Low contrast ratio", "below")
        } else {
            return None;
        };

        Some(
            ViolationRecord::new("Sign Contrast", severity, "703.5")
                .with_description(format!(
                    "{} of {:.2}:1 detected, {} ADA minimum of 3:1",
                    qualifier, ratio, margin
                ))
                .with_recommendation(
                    "Improve contrast between characters and background. Use light characters on dark background or vice versa to achieve minimum 3:1 contrast ratio.",
                )
                .with_confidence(confidence)
                .with_measurement("contrast_ratio", round_to(ratio, 2))
                .with_measurement("min_required_ratio", p.min_contrast_ratio)
                .with_measurement("max_luminance", max_l as f64)
                .with_measurement("min_luminance", min_l as f64),
        )
    }

    fn check_tactile(&self, gray: &GrayImage) -> Option<ViolationRecord> {
        let p = &self.params;
        let scores = patch_deviations(gray, p.patch_size);
        if scores.is_empty() {
            return None;
        }

        let average = scores.iter().sum::<f64>() / scores.len() as f64;
        let peak = scores.iter().cloned().fold(0.0, f64::max);
        debug!(average, peak, "sign texture");

        if average >= p.min_texture || peak >= p.max_texture_peak {
            return None;
        }

        Some(
            ViolationRecord::new("Tactile Features", Severity::Minor, "703.2")
                .with_description(format!(
                    "Smooth surface detected (texture score: {:.1}). Permanent room signs must have raised characters and Grade 2 braille.",
                    average
                ))
                .with_recommendation(
                    "For permanent room identification signs, add raised characters (5/8\" to 2\" height) and Grade 2 braille. Characters must be raised at least 1/32 inch.",
                )
                .with_confidence(0.55)
                .with_measurement("average_texture_score", round_to(average, 1))
                .with_measurement("max_texture_score", round_to(peak, 1))
                .with_measurement("texture_threshold", p.min_texture)
                .with_measurement("min_character_height_inches", 0.625)
                .with_measurement("max_character_height_inches", 2.0),
        )
    }
}

/// WCAG-style ratio of two lightness values on the 0..=255 scale
pub fn contrast_ratio(lighter: u8, darker: u8) -> f64 {
    let (l1, l2) = (lighter.max(darker) as f64 / 255.0, lighter.min(darker) as f64 / 255.0);
    (l1 + 0.05) / (l2 + 0.05)
}

/// Standard deviation of each full `size` x `size` patch.
///
/// Patches start every `size` pixels and stop one patch short of the far
/// edges, so a region no larger than a patch has no scores.
fn patch_deviations(gray: &GrayImage, size: u32) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    if size == 0 {
        return Vec::new();
    }

    let mut scores = Vec::new();
    for y in (0..height.saturating_sub(size)).step_by(size as usize) {
        for x in (0..width.saturating_sub(size)).step_by(size as usize) {
            let values: Vec<f64> = (y..y + size)
                .flat_map(|py| (x..x + size).map(move |px| (px, py)))
                .map(|(px, py)| gray.get_pixel(px, py)[0] as f64)
                .collect();
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            scores.push(variance.sqrt());
        }
    }
    scores
}

impl CategoryAnalyzer for SignageAnalyzer {
    fn name(&self) -> &'static str {
        "signage"
    }

    fn analyze(&self, region: &RgbImage, _context: &DetectionContext<'_>) -> Vec<ViolationRecord> {
        if is_empty_region(region) {
            return Vec::new();
        }

        [self.check_contrast(region), self.check_tactile(&to_gray(region))]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{assert_empty_regions_yield_nothing, run, solid};
    use image::Rgb;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn find<'a>(violations: &'a [ViolationRecord], kind: &str) -> Option<&'a ViolationRecord> {
        violations.iter().find(|v| v.violation_type == kind)
    }

    #[test]
    fn test_empty_region() {
        assert_empty_regions_yield_nothing(&SignageAnalyzer::default(), "sign");
    }

    #[test]
    fn test_black_and_white_halves_pass_contrast() {
        let mut region = solid(200, 100, [10, 10, 10]);
        draw_filled_rect_mut(&mut region, Rect::at(100, 0).of_size(100, 100), Rgb([245, 245, 245]));
        let violations = run(&SignageAnalyzer::default(), "sign", &region);
        assert!(find(&violations, "Sign Contrast").is_none());
    }

    #[test]
    fn test_close_grays_are_critical() {
        let mut region = solid(400, 200, [100, 100, 100]);
        draw_filled_rect_mut(&mut region, Rect::at(100, 50).of_size(200, 100), Rgb([130, 130, 130]));
        let violations = run(&SignageAnalyzer::default(), "sign", &region);
        let contrast = find(&violations, "Sign Contrast").unwrap();
        assert_eq!(contrast.severity, Severity::Critical);
        assert!(contrast.description.contains("well below ADA minimum"));
        assert!(contrast.measurements["contrast_ratio"] < 2.5);
        assert!(contrast.measurements["max_luminance"] > contrast.measurements["min_luminance"]);

        let tactile = find(&violations, "Tactile Features").unwrap();
        assert_eq!(tactile.severity, Severity::Minor);
        assert_eq!(tactile.ada_code, "703.2");
    }

    #[test]
    fn test_contrast_ratio_bands() {
        assert!((contrast_ratio(255, 0) - 21.0).abs() < 1e-9);
        assert_eq!(contrast_ratio(0, 255), contrast_ratio(255, 0));
        assert!((contrast_ratio(80, 80) - 1.0).abs() < 1e-9);
        // 2.5 <= ratio < 3.0 is the Moderate band
        let moderate = contrast_ratio(75, 18);
        assert!(moderate >= 2.5 && moderate < 3.0, "{}", moderate);
    }

    #[test]
    fn test_textured_surface_has_no_tactile_finding() {
        let mut region = solid(100, 100, [0, 0, 0]);
        for (x, y, pixel) in region.enumerate_pixels_mut() {
            if (x / 2 + y / 2) % 2 == 0 {
                *pixel = Rgb([255, 255, 255]);
            }
        }
        let violations = run(&SignageAnalyzer::default(), "sign", &region);
        assert!(find(&violations, "Tactile Features").is_none());
    }

    #[test]
    fn test_patch_grid() {
        assert!(patch_deviations(&GrayImage::new(20, 20), 20).is_empty());
        assert_eq!(patch_deviations(&GrayImage::new(41, 61), 20).len(), 6);
    }
}

//! Accessible parking signage checks based on sign colors

use ada_types::{round_to, Severity, ViolationRecord};
use image::RgbImage;
use tracing::debug;

use super::{CategoryAnalyzer, DetectionContext};
use crate::imaging::{is_empty_region, rgb_to_hsv, HsvRange};

#[derive(Debug, Clone, PartialEq)]
pub struct ParkingParams {
    /// Sign background (hue on the 0..180 scale)
    pub blue: HsvRange,
    /// Wheelchair symbol
    pub white: HsvRange,
    pub min_blue_fraction: f64,
    pub min_white_fraction: f64,
    /// Mean blue row below this fraction of the height suggests a low sign
    pub low_sign_position: f64,
}

impl Default for ParkingParams {
    fn default() -> Self {
        Self {
            blue: HsvRange::new([90, 80, 50], [135, 255, 255]),
            white: HsvRange::new([0, 0, 180], [180, 50, 255]),
            min_blue_fraction: 0.05,
            min_white_fraction: 0.02,
            low_sign_position: 0.6,
        }
    }
}

/// Color statistics of one region
#[derive(Debug, Clone, Copy, PartialEq)]
struct SignColors {
    blue_fraction: f64,
    white_fraction: f64,
    /// Mean row of blue pixels over the height, `None` without blue
    blue_position: Option<f64>,
}

#[derive(Debug, Default)]
pub struct ParkingAnalyzer {
    params: ParkingParams,
}

impl ParkingAnalyzer {
    pub fn new(params: ParkingParams) -> Self {
        Self { params }
    }

    fn measure(&self, region: &RgbImage) -> SignColors {
        let (mut blue, mut white, mut blue_rows) = (0u64, 0u64, 0u64);
        for (_, y, pixel) in region.enumerate_pixels() {
            let hsv = rgb_to_hsv(pixel);
            if self.params.blue.contains(&hsv) {
                blue += 1;
                blue_rows += y as u64;
            }
            if self.params.white.contains(&hsv) {
                white += 1;
            }
        }

        let total = (region.width() as u64 * region.height() as u64) as f64;
        SignColors {
            blue_fraction: blue as f64 / total,
            white_fraction: white as f64 / total,
            blue_position: (blue > 0).then(|| blue_rows as f64 / blue as f64 / region.height() as f64),
        }
    }

    fn check_signage(&self, colors: &SignColors) -> Option<ViolationRecord> {
        let p = &self.params;
        let has_blue = colors.blue_fraction >= p.min_blue_fraction;
        let has_white = colors.white_fraction >= p.min_white_fraction;

        if !has_blue {
            return Some(
                ViolationRecord::new("Parking Signage", Severity::Critical, "502.6")
                    .with_description(format!(
                        "No blue signage detected (found {:.1}% blue pixels). Accessible parking spaces must display the International Symbol of Accessibility on a sign.",
                        colors.blue_fraction * 100.0
                    ))
                    .with_recommendation(
                        "Install accessible parking sign with International Symbol of Accessibility (blue background, white wheelchair symbol) at 60 inches minimum height above ground.",
                    )
                    .with_confidence(0.80)
                    .with_measurement("blue_percentage", round_to(colors.blue_fraction * 100.0, 1))
                    .with_measurement("white_percentage", round_to(colors.white_fraction * 100.0, 1))
                    .with_measurement("required_blue_percentage", p.min_blue_fraction * 100.0),
            );
        }

        if !has_white {
            return Some(
                ViolationRecord::new("Wheelchair Symbol", Severity::Critical, "502.6")
                    .with_description(format!(
                        "Blue sign detected but missing white wheelchair symbol (found {:.1}% white). Sign must include International Symbol of Accessibility.",
                        colors.white_fraction * 100.0
                    ))
                    .with_recommendation(
                        "Verify sign includes white wheelchair symbol. Replace if symbol is missing or obscured.",
                    )
                    .with_confidence(0.70)
                    .with_measurement("blue_percentage", round_to(colors.blue_fraction * 100.0, 1))
                    .with_measurement("white_percentage", round_to(colors.white_fraction * 100.0, 1)),
            );
        }

        None
    }

    fn check_sign_height(&self, colors: &SignColors) -> Option<ViolationRecord> {
        let position = colors.blue_position?;
        if position <= self.params.low_sign_position {
            return None;
        }

        Some(
            ViolationRecord::new("Sign Height", Severity::Moderate, "502.6")
                .with_description(format!(
                    "Sign appears in lower portion of image (position: {:.0}% from top). ADA requires signs at 60 inches minimum above ground.",
                    position * 100.0
                ))
                .with_recommendation(
                    "Verify sign mounting height with physical measurement. If below 60 inches, raise sign to compliant height.",
                )
                .with_confidence(0.60)
                .with_measurement("vertical_position_percentage", (position * 100.0).round())
                .with_measurement("required_height_inches", 60.0),
        )
    }
}

impl CategoryAnalyzer for ParkingAnalyzer {
    fn name(&self) -> &'static str {
        "parking"
    }

    fn analyze(&self, region: &RgbImage, _context: &DetectionContext<'_>) -> Vec<ViolationRecord> {
        if is_empty_region(region) {
            return Vec::new();
        }

        let colors = self.measure(region);
        debug!(
            blue = colors.blue_fraction,
            white = colors.white_fraction,
            "parking sign colors"
        );

        [self.check_signage(&colors), self.check_sign_height(&colors)]
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

    fn types(violations: &[ViolationRecord]) -> Vec<&str> {
        violations.iter().map(|v| v.violation_type.as_str()).collect()
    }

    #[test]
    fn test_empty_region() {
        assert_empty_regions_yield_nothing(&ParkingAnalyzer::default(), "car");
    }

    #[test]
    fn test_no_blue_is_critical_signage() {
        let violations = run(&ParkingAnalyzer::default(), "car", &solid(640, 480, [128, 128, 128]));
        assert_eq!(types(&violations), vec!["Parking Signage"]);
        assert_eq!(violations[0].severity, Severity::Critical);
        assert!((violations[0].confidence - 0.80).abs() < 1e-9);
        assert_eq!(violations[0].measurements["blue_percentage"], 0.0);
        assert_eq!(violations[0].measurements["required_blue_percentage"], 5.0);
    }

    #[test]
    fn test_blue_sign_with_symbol_passes() {
        let mut region = solid(640, 480, [0, 0, 255]);
        draw_filled_rect_mut(&mut region, Rect::at(250, 100).of_size(100, 100), Rgb([255, 255, 255]));
        let violations = run(&ParkingAnalyzer::default(), "car", &region);
        assert!(!types(&violations).contains(&"Parking Signage"));
        assert!(!types(&violations).contains(&"Wheelchair Symbol"));
    }

    #[test]
    fn test_blue_without_symbol() {
        let violations = run(&ParkingAnalyzer::default(), "car", &solid(100, 100, [20, 40, 200]));
        assert_eq!(types(&violations), vec!["Wheelchair Symbol"]);
        assert!((violations[0].confidence - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_low_sign_height() {
        let mut region = solid(100, 100, [128, 128, 128]);
        draw_filled_rect_mut(&mut region, Rect::at(20, 70).of_size(60, 30), Rgb([0, 0, 255]));
        draw_filled_rect_mut(&mut region, Rect::at(40, 80).of_size(10, 10), Rgb([255, 255, 255]));
        let violations = run(&ParkingAnalyzer::default(), "parking", &region);
        let height = violations.iter().find(|v| v.violation_type == "Sign Height").unwrap();
        assert_eq!(height.severity, Severity::Moderate);
        assert!(height.measurements["vertical_position_percentage"] > 60.0);
    }

    #[test]
    fn test_upper_sign_has_no_height_finding() {
        let mut region = solid(100, 100, [128, 128, 128]);
        draw_filled_rect_mut(&mut region, Rect::at(20, 5).of_size(60, 30), Rgb([0, 0, 255]));
        draw_filled_rect_mut(&mut region, Rect::at(40, 12).of_size(20, 15), Rgb([255, 255, 255]));
        let violations = run(&ParkingAnalyzer::default(), "parking", &region);
        assert!(violations.is_empty(), "{:?}", types(&violations));
    }
}

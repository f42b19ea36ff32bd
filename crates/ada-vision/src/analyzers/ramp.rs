//! Ramp checks: running slope from line angles, handrails from side verticals

use ada_types::{round_to, Severity, ViolationRecord};
use image::{GrayImage, RgbImage};
use tracing::debug;

use super::{CategoryAnalyzer, DetectionContext};
use crate::imaging::{canny_edges, detect_segments, is_empty_region, to_gray, LineSegment, SegmentOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct RampParams {
    /// 1:12 running slope
    pub max_slope_degrees: f64,
    pub warning_slope_degrees: f64,
    /// Open interval of angles considered ramp surfaces rather than noise
    pub angle_band: (f64, f64),
    pub canny_low: f32,
    pub canny_high: f32,
    pub slope_votes: u32,
    /// Minimum slope segment length as a fraction of the shorter side
    pub slope_min_length: f64,
    pub slope_max_gap: u32,
    pub rail_votes: u32,
    /// Minimum rail segment length as a fraction of the height
    pub rail_min_length: f64,
    pub rail_max_gap: u32,
    pub rail_min_angle: f64,
    /// Left and right side bands as fractions of the width
    pub rail_sides: (f64, f64),
    pub suppression_radius: u32,
}

impl Default for RampParams {
    fn default() -> Self {
        Self {
            max_slope_degrees: 4.76,
            warning_slope_degrees: 4.0,
            angle_band: (10.0, 80.0),
            canny_low: 50.0,
            canny_high: 150.0,
            slope_votes: 50,
            slope_min_length: 0.2,
            slope_max_gap: 20,
            rail_votes: 40,
            rail_min_length: 0.3,
            rail_max_gap: 30,
            rail_min_angle: 60.0,
            rail_sides: (0.3, 0.7),
            suppression_radius: 8,
        }
    }
}

const MAX_SLOPE_PERCENTAGE: f64 = 8.33;

#[derive(Debug, Default)]
pub struct RampAnalyzer {
    params: RampParams,
}

impl RampAnalyzer {
    pub fn new(params: RampParams) -> Self {
        Self { params }
    }

    fn check_slope(&self, edges: &GrayImage) -> Option<ViolationRecord> {
        let p = &self.params;
        let (width, height) = edges.dimensions();
        let options = SegmentOptions {
            vote_threshold: p.slope_votes,
            suppression_radius: p.suppression_radius,
            min_length: width.min(height) as f64 * p.slope_min_length,
            max_gap: p.slope_max_gap,
        };

        let steepest = detect_segments(edges, &options)
            .iter()
            .map(|s| s.angle_degrees)
            .filter(|a| *a > p.angle_band.0 && *a < p.angle_band.1)
            .fold(None, |best: Option<f64>, a| Some(best.map_or(a, |b| b.max(a))))?;
        debug!(steepest, "ramp steepest line angle");

        let (severity, confidence, verb) = if steepest > p.max_slope_degrees {
            (Severity::Critical, 0.60, "exceeding")
        } else if steepest > p.warning_slope_degrees {
            (Severity::Moderate, 0.55, "approaching")
        } else {
            return None;
        };

        Some(
            ViolationRecord::new("Ramp Slope", severity, "405.2")
                .with_description(format!(
                    "Detected diagonal line at {:.1}° angle, {} ADA maximum slope of {}° (1:12 ratio)",
                    steepest, verb, p.max_slope_degrees
                ))
                .with_recommendation(
                    "Verify ramp slope with physical measurement (rise:run ratio). If steeper than 1:12 (8.33%), reconstruct ramp to meet compliance or install alternative accessible route.",
                )
                .with_confidence(confidence)
                .with_measurement("detected_angle_degrees", round_to(steepest, 1))
                .with_measurement("max_allowed_angle_degrees", p.max_slope_degrees)
                .with_measurement("max_allowed_percentage", MAX_SLOPE_PERCENTAGE),
        )
    }

    fn check_handrails(&self, edges: &GrayImage) -> Option<ViolationRecord> {
        let p = &self.params;
        let (width, height) = edges.dimensions();
        let options = SegmentOptions {
            vote_threshold: p.rail_votes,
            suppression_radius: p.suppression_radius,
            min_length: height as f64 * p.rail_min_length,
            max_gap: p.rail_max_gap,
        };

        let rails: Vec<LineSegment> = detect_segments(edges, &options)
            .into_iter()
            .filter(|s| s.angle_degrees >= p.rail_min_angle)
            .collect();

        if rails.is_empty() {
            return Some(
                ViolationRecord::new("Ramp Handrails", Severity::Moderate, "405.8")
                    .with_description(
                        "No handrail features detected. Ramps with rise greater than 6 inches must have handrails on both sides.",
                    )
                    .with_recommendation(
                        "Install handrails on both sides of ramp, 34-38 inches above ramp surface, extending 12 inches beyond top and bottom of ramp.",
                    )
                    .with_confidence(0.65)
                    .with_measurement("left_handrail_features", 0.0)
                    .with_measurement("right_handrail_features", 0.0)
                    .with_measurement("required_handrails", 2.0),
            );
        }

        let left_edge = width as f64 * p.rail_sides.0;
        let right_edge = width as f64 * p.rail_sides.1;
        let left = rails.iter().filter(|s| s.mid_x() < left_edge).count();
        let right = rails.iter().filter(|s| s.mid_x() > right_edge).count();
        debug!(left, right, "ramp handrail features");

        let missing: Vec<&str> = [(left, "left"), (right, "right")]
            .iter()
            .filter(|(count, _)| *count == 0)
            .map(|(_, side)| *side)
            .collect();
        if missing.is_empty() {
            return None;
        }

        Some(
            ViolationRecord::new("Ramp Handrails", Severity::Moderate, "405.8")
                .with_description(format!(
                    "Handrail features missing on {} side(s). Ramps must have handrails on both sides if rise exceeds 6 inches.",
                    missing.join(" and ")
                ))
                .with_recommendation(
                    "Install handrails on both sides, 34-38 inches above ramp surface, with gripping surface complying with ADA 505.",
                )
                .with_confidence(0.60)
                .with_measurement("left_handrail_features", left as f64)
                .with_measurement("right_handrail_features", right as f64)
                .with_measurement("required_handrails", 2.0),
        )
    }
}

impl CategoryAnalyzer for RampAnalyzer {
    fn name(&self) -> &'static str {
        "ramp"
    }

    fn analyze(&self, region: &RgbImage, _context: &DetectionContext<'_>) -> Vec<ViolationRecord> {
        if is_empty_region(region) {
            return Vec::new();
        }

        let edges = canny_edges(&to_gray(region), self.params.canny_low, self.params.canny_high);

        [self.check_slope(&edges), self.check_handrails(&edges)]
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
    use imageproc::drawing::draw_line_segment_mut;

    fn find<'a>(violations: &'a [ViolationRecord], kind: &str) -> Option<&'a ViolationRecord> {
        violations.iter().find(|v| v.violation_type == kind)
    }

    #[test]
    fn test_empty_region() {
        assert_empty_regions_yield_nothing(&RampAnalyzer::default(), "ramp");
    }

    #[test]
    fn test_steep_diagonal_reports_its_angle() {
        let mut region = solid(640, 480, [0, 0, 0]);
        for offset in 0..3 {
            let o = offset as f32;
            draw_line_segment_mut(&mut region, (100.0, 400.0 + o), (500.0, 100.0 + o), Rgb([255, 255, 255]));
        }
        let violations = run(&RampAnalyzer::default(), "ramp", &region);

        let slope = find(&violations, "Ramp Slope").unwrap();
        let expected = (300.0f64 / 400.0).atan().to_degrees();
        assert_eq!(slope.severity, Severity::Critical);
        assert_eq!(slope.ada_code, "405.2");
        assert!((slope.measurements["detected_angle_degrees"] - expected).abs() < 2.0);
        assert_eq!(slope.measurements["max_allowed_angle_degrees"], 4.76);

        let rails = find(&violations, "Ramp Handrails").unwrap();
        assert!(rails.description.starts_with("No handrail features"));
    }

    #[test]
    fn test_blank_ramp_flags_only_handrails() {
        let violations = run(&RampAnalyzer::default(), "ramp", &solid(200, 200, [100, 100, 100]));
        assert!(find(&violations, "Ramp Slope").is_none());
        assert!((find(&violations, "Ramp Handrails").unwrap().confidence - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_handrail_sides() {
        let mut both = solid(300, 300, [0, 0, 0]);
        draw_line_segment_mut(&mut both, (30.0, 20.0), (30.0, 280.0), Rgb([255, 255, 255]));
        draw_line_segment_mut(&mut both, (270.0, 20.0), (270.0, 280.0), Rgb([255, 255, 255]));
        let violations = run(&RampAnalyzer::default(), "ramp", &both);
        assert!(find(&violations, "Ramp Handrails").is_none());

        let mut left_only = solid(300, 300, [0, 0, 0]);
        draw_line_segment_mut(&mut left_only, (30.0, 20.0), (30.0, 280.0), Rgb([255, 255, 255]));
        let violations = run(&RampAnalyzer::default(), "ramp", &left_only);
        let rails = find(&violations, "Ramp Handrails").unwrap();
        assert!(rails.description.contains("missing on right side"));
        assert_eq!(rails.measurements["right_handrail_features"], 0.0);
        assert!(rails.measurements["left_handrail_features"] >= 1.0);
    }
}

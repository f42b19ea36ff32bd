//! Door and entrance checks: clear width, threshold, hardware

use ada_types::{round_to, Severity, ViolationRecord};
use image::{imageops, GrayImage, RgbImage};
use tracing::debug;

use super::{CategoryAnalyzer, DetectionContext};
use crate::imaging::{canny_edges, compact_contours, is_empty_region, to_gray};

/// Tuning constants for the door checks.
///
/// A standard 80" door 36" wide has a height/width ratio near 2.2; a
/// 28" door is near 2.9.
#[derive(Debug, Clone, PartialEq)]
pub struct DoorParams {
    pub narrow_ratio: f64,
    pub very_narrow_ratio: f64,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Fraction of the region height scanned for a threshold
    pub threshold_band: f64,
    /// Fraction of the width a row must cover to count as a horizontal edge
    pub threshold_row_coverage: f64,
    pub threshold_density: f64,
    /// Vertical band (fractions of height) where hardware is expected
    pub hardware_band: (f64, f64),
    pub hardware_min_area: f64,
    pub hardware_max_area: f64,
    pub hardware_max_elongation: f64,
    pub min_hardware_features: usize,
}

impl Default for DoorParams {
    fn default() -> Self {
        Self {
            narrow_ratio: 2.5,
            very_narrow_ratio: 3.0,
            canny_low: 50.0,
            canny_high: 150.0,
            threshold_band: 0.15,
            threshold_row_coverage: 0.3,
            threshold_density: 0.3,
            hardware_band: (0.4, 0.6),
            hardware_min_area: 0.002,
            hardware_max_area: 0.05,
            hardware_max_elongation: 3.0,
            min_hardware_features: 2,
        }
    }
}

const REQUIRED_WIDTH_INCHES: f64 = 32.0;

#[derive(Debug, Default)]
pub struct DoorAnalyzer {
    params: DoorParams,
}

impl DoorAnalyzer {
    pub fn new(params: DoorParams) -> Self {
        Self { params }
    }

    fn check_width(&self, width: u32, height: u32) -> Option<ViolationRecord> {
        let p = &self.params;
        let aspect_ratio = height as f64 / width as f64;

        let (base, ceiling, estimated_width, qualifier) = if aspect_ratio > p.very_narrow_ratio {
            (0.70, 0.80, 28.0, "significantly below")
        } else if aspect_ratio > p.narrow_ratio {
            (0.60, 0.70, 30.0, "may be below")
        } else {
            return None;
        };

        // Further past the threshold means a more certain finding
        let threshold = if aspect_ratio > p.very_narrow_ratio {
            p.very_narrow_ratio
        } else {
            p.narrow_ratio
        };
        let overshoot = (aspect_ratio - threshold) / threshold;
        let confidence = (base + overshoot * 0.5).min(ceiling);

        Some(
            ViolationRecord::new("Door Width", Severity::Critical, "404.2.3")
                .with_description(format!(
                    "Door aspect ratio ({:.2}) suggests width {} required 32 inches (estimated ~{}\")",
                    aspect_ratio, qualifier, estimated_width
                ))
                .with_recommendation(
                    "Verify actual door width with physical measurement. If below 32 inches clear width, widen opening or install wider door.",
                )
                .with_confidence(confidence)
                .with_measurement("aspect_ratio", round_to(aspect_ratio, 2))
                .with_measurement("estimated_width_inches", estimated_width)
                .with_measurement("required_width_inches", REQUIRED_WIDTH_INCHES),
        )
    }

    fn check_threshold(&self, gray: &GrayImage) -> Option<ViolationRecord> {
        let p = &self.params;
        let edges = canny_edges(gray, p.canny_low, p.canny_high);
        let start_row = (gray.height() as f64 * (1.0 - p.threshold_band)) as u32;
        let density = horizontal_edge_density(&edges, start_row, p.threshold_row_coverage);
        debug!(density, "door threshold edge density");

        if density <= p.threshold_density {
            return None;
        }

        Some(
            ViolationRecord::new("Door Threshold", Severity::Moderate, "404.2.5")
                .with_description(format!(
                    "Detected horizontal edge features at door base (density: {:.2}), suggesting possible raised threshold exceeding 1/2 inch maximum",
                    density
                ))
                .with_recommendation(
                    "Verify threshold height with physical measurement. If over 1/2 inch, install beveled threshold or remove raised threshold.",
                )
                .with_confidence((0.55 + density * 0.2).min(0.75))
                .with_measurement("edge_density", round_to(density, 2))
                .with_measurement("max_threshold_height_inches", 0.5),
        )
    }

    fn check_hardware(&self, gray: &GrayImage) -> Option<ViolationRecord> {
        let features = self.count_hardware_features(gray);
        debug!(features, "door hardware features");

        if features >= self.params.min_hardware_features {
            return None;
        }

        Some(
            ViolationRecord::new("Door Hardware", Severity::Minor, "404.2.7")
                .with_description(format!(
                    "Limited hardware features detected ({} features found). Door hardware should be operable with one hand without tight grasping.",
                    features
                ))
                .with_recommendation(
                    "Verify door hardware is lever-style or push-type, operable with closed fist. Replace round knobs or twist-style hardware.",
                )
                .with_confidence(0.50)
                .with_measurement("hardware_features_detected", features as f64),
        )
    }

    fn count_hardware_features(&self, gray: &GrayImage) -> usize {
        let p = &self.params;
        let (width, height) = gray.dimensions();
        let top = (height as f64 * p.hardware_band.0) as u32;
        let bottom = (height as f64 * p.hardware_band.1) as u32;
        if bottom <= top {
            return 0;
        }

        let band = imageops::crop_imm(gray, 0, top, width, bottom - top).to_image();
        let edges = canny_edges(&band, p.canny_low, p.canny_high);

        let region_area = width as f64 * height as f64;
        let (min_area, max_area) = (region_area * p.hardware_min_area, region_area * p.hardware_max_area);

        compact_contours(&edges)
            .iter()
            .filter(|c| c.area > min_area && c.area < max_area)
            .filter(|c| c.elongation() < p.hardware_max_elongation)
            .count()
    }
}

/// Fraction of rows from `start_row` down whose edge pixels cover more
/// than `coverage` of the width
fn horizontal_edge_density(edges: &GrayImage, start_row: u32, coverage: f64) -> f64 {
    let (width, height) = edges.dimensions();
    if start_row >= height || width == 0 {
        return 0.0;
    }

    let min_pixels = width as f64 * coverage;
    let strong_rows = (start_row..height)
        .filter(|&y| {
            let count = (0..width).filter(|&x| edges.get_pixel(x, y)[0] > 0).count();
            count as f64 > min_pixels
        })
        .count();

    strong_rows as f64 / (height - start_row) as f64
}

impl CategoryAnalyzer for DoorAnalyzer {
    fn name(&self) -> &'static str {
        "door"
    }

    fn analyze(&self, region: &RgbImage, _context: &DetectionContext<'_>) -> Vec<ViolationRecord> {
        if is_empty_region(region) {
            return Vec::new();
        }

        let gray = to_gray(region);
        let (width, height) = region.dimensions();

        [
            self.check_width(width, height),
            self.check_threshold(&gray),
            self.check_hardware(&gray),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

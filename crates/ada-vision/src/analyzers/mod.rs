//! Rule-based category analyzers
//!
//! Each analyzer turns pixel statistics of one detection crop into zero or
//! more violation records. Analyzers are deterministic and never fail: a
//! region too small to measure simply yields no finding.

pub mod door;
pub mod parking;
pub mod pathway;
pub mod ramp;
pub mod signage;

pub use door::{DoorAnalyzer, DoorParams};
pub use parking::{ParkingAnalyzer, ParkingParams};
pub use pathway::{PathwayAnalyzer, PathwayParams};
pub use ramp::{RampAnalyzer, RampParams};
pub use signage::{SignageAnalyzer, SignageParams};

use ada_types::{Detection, ViolationRecord};
use image::RgbImage;

/// Where a crop came from
#[derive(Debug, Clone, Copy)]
pub struct DetectionContext<'a> {
    pub detection: &'a Detection,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl<'a> DetectionContext<'a> {
    pub fn new(detection: &'a Detection, frame_width: u32, frame_height: u32) -> Self {
        Self {
            detection,
            frame_width,
            frame_height,
        }
    }

    /// Frame area in pixels, 0 for a degenerate frame
    pub fn frame_area(&self) -> u64 {
        self.frame_width as u64 * self.frame_height as u64
    }
}

/// One heuristic scorer specialized to an object category
pub trait CategoryAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Analyze the cropped region of one detection
    fn analyze(&self, region: &RgbImage, context: &DetectionContext<'_>) -> Vec<ViolationRecord>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use ada_types::{BoundingBox, Severity};
    use image::Rgb;

    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    pub fn detection_for(label: &str, region: &RgbImage) -> Detection {
        Detection::new(label, 0.9, BoundingBox::new(0, 0, region.width(), region.height()))
    }

    /// Run an analyzer over a crop that fills the whole frame
    pub fn run(analyzer: &dyn CategoryAnalyzer, label: &str, region: &RgbImage) -> Vec<ViolationRecord> {
        let detection = detection_for(label, region);
        let context = DetectionContext::new(&detection, region.width(), region.height());
        let violations = analyzer.analyze(region, &context);
        assert_well_formed(&violations);
        violations
    }

    pub fn assert_well_formed(violations: &[ViolationRecord]) {
        for v in violations {
            assert!(Severity::ALL.contains(&v.severity));
            assert!((0.0..=1.0).contains(&v.confidence), "{:?}", v);
            assert!(!v.ada_code.is_empty());
            assert!(v.measurements.values().all(|m| m.is_finite()));
        }
    }

    pub fn assert_empty_regions_yield_nothing(analyzer: &dyn CategoryAnalyzer, label: &str) {
        for (w, h) in [(0, 0), (0, 40), (40, 0)] {
            let region = RgbImage::new(w, h);
            assert!(run(analyzer, label, &region).is_empty(), "{}x{}", w, h);
        }
    }
}

//! Label routing and the rule-based compliance analyzer

use ada_types::{Detection, RULE_BASED_METHOD};
use image::RgbImage;
use tracing::debug;

use crate::analyzers::{
    CategoryAnalyzer, DetectionContext, DoorAnalyzer, ParkingAnalyzer, PathwayAnalyzer, RampAnalyzer,
    SignageAnalyzer,
};
use crate::imaging::crop_region;
use crate::{AnalysisOutcome, ComplianceAnalyzer};

/// Known object categories; anything else is checked as a possible obstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Door,
    Parking,
    Ramp,
    Signage,
    Other,
}

impl Category {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "door" | "entrance" => Category::Door,
            "car" | "truck" | "bus" | "parking" => Category::Parking,
            "ramp" | "stairs" | "steps" => Category::Ramp,
            "sign" | "signage" | "stop_sign" | "street_sign" => Category::Signage,
            _ => Category::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Door => "door",
            Category::Parking => "parking",
            Category::Ramp => "ramp",
            Category::Signage => "signage",
            Category::Other => "other",
        }
    }
}

/// Lowercase, trim, and join words with underscores ("Stop Sign" -> "stop_sign")
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Routes each detection to its category analyzer
#[derive(Debug, Default)]
pub struct RuleBasedAnalyzer {
    door: DoorAnalyzer,
    parking: ParkingAnalyzer,
    pathway: PathwayAnalyzer,
    ramp: RampAnalyzer,
    signage: SignageAnalyzer,
}

impl RuleBasedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_door(mut self, door: DoorAnalyzer) -> Self {
        self.door = door;
        self
    }

    pub fn with_parking(mut self, parking: ParkingAnalyzer) -> Self {
        self.parking = parking;
        self
    }

    pub fn with_pathway(mut self, pathway: PathwayAnalyzer) -> Self {
        self.pathway = pathway;
        self
    }

    pub fn with_ramp(mut self, ramp: RampAnalyzer) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_signage(mut self, signage: SignageAnalyzer) -> Self {
        self.signage = signage;
        self
    }

    pub fn analyzer_for(&self, category: Category) -> &dyn CategoryAnalyzer {
        match category {
            Category::Door => &self.door,
            Category::Parking => &self.parking,
            Category::Ramp => &self.ramp,
            Category::Signage => &self.signage,
            Category::Other => &self.pathway,
        }
    }

    pub fn route(&self, detection: &Detection) -> &dyn CategoryAnalyzer {
        self.analyzer_for(Category::from_label(&detection.label))
    }
}

impl ComplianceAnalyzer for RuleBasedAnalyzer {
    fn name(&self) -> &'static str {
        RULE_BASED_METHOD
    }

    fn analyze_detection(&self, image: &RgbImage, detection: &Detection) -> AnalysisOutcome {
        let analyzer = self.route(detection);
        debug!(label = %detection.label, analyzer = analyzer.name(), "routing detection");

        let region = crop_region(image, &detection.bbox);
        let context = DetectionContext::new(detection, image.width(), image.height());
        AnalysisOutcome::completed(analyzer.analyze(&region, &context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_types::BoundingBox;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Stop Sign "), "stop_sign");
        assert_eq!(normalize_label("potted-plant"), "potted_plant");
        assert_eq!(normalize_label("DOOR"), "door");
    }

    #[test]
    fn test_category_from_label() {
        assert_eq!(Category::from_label("Door"), Category::Door);
        assert_eq!(Category::from_label("entrance"), Category::Door);
        assert_eq!(Category::from_label("bus"), Category::Parking);
        assert_eq!(Category::from_label("steps"), Category::Ramp);
        assert_eq!(Category::from_label("street sign"), Category::Signage);
        assert_eq!(Category::from_label("umbrella"), Category::Other);
        assert_eq!(Category::from_label(""), Category::Other);
    }

    #[test]
    fn test_routing() {
        let router = RuleBasedAnalyzer::new();
        let bbox = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(router.route(&Detection::new("door", 0.9, bbox)).name(), "door");
        assert_eq!(router.route(&Detection::new("umbrella", 0.9, bbox)).name(), "pathway");
        assert_eq!(router.route(&Detection::new("sign", 0.9, bbox)).name(), "signage");
        assert_eq!(router.route(&Detection::new("truck", 0.9, bbox)).name(), "parking");
        assert_eq!(router.route(&Detection::new("ramp", 0.9, bbox)).name(), "ramp");
    }

    #[test]
    fn test_detection_outside_frame_has_no_findings() {
        let image = RgbImage::new(100, 100);
        let detection = Detection::new("door", 0.9, BoundingBox::new(500, 500, 50, 150));
        match RuleBasedAnalyzer::new().analyze_detection(&image, &detection) {
            AnalysisOutcome::Completed { violations, .. } => assert!(violations.is_empty()),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

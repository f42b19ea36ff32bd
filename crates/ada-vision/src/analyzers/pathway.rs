//! Pathway obstruction check for movable objects in accessible routes

use ada_types::{round_to, Severity, ViolationRecord};
use image::RgbImage;

use super::{CategoryAnalyzer, DetectionContext};
use crate::imaging::is_empty_region;
use crate::router::normalize_label;

#[derive(Debug, Clone, PartialEq)]
pub struct PathwayParams {
    /// Object labels that commonly obstruct a walkway
    pub obstruction_labels: Vec<&'static str>,
    /// Labels whose obstructions are more likely to be a problem
    pub high_risk_labels: Vec<&'static str>,
    pub moderate_size: f64,
    pub critical_size: f64,
    /// Frame fraction above which the description mentions the size
    pub mention_size: f64,
    pub high_risk_bonus: f64,
    pub max_confidence: f64,
}

impl Default for PathwayParams {
    fn default() -> Self {
        Self {
            obstruction_labels: vec![
                "chair",
                "couch",
                "bench",
                "potted_plant",
                "vase",
                "suitcase",
                "backpack",
                "handbag",
                "umbrella",
                "bicycle",
                "motorcycle",
                "fire_hydrant",
            ],
            high_risk_labels: vec!["chair", "couch", "bench", "bicycle"],
            moderate_size: 0.3,
            critical_size: 0.5,
            mention_size: 0.4,
            high_risk_bonus: 0.05,
            max_confidence: 0.75,
        }
    }
}

#[derive(Debug, Default)]
pub struct PathwayAnalyzer {
    params: PathwayParams,
}

impl PathwayAnalyzer {
    pub fn new(params: PathwayParams) -> Self {
        Self { params }
    }

    fn check_obstruction(&self, label: &str, relative_size: f64) -> ViolationRecord {
        let p = &self.params;

        let (severity, mut confidence) = if relative_size > p.critical_size {
            (Severity::Critical, 0.70)
        } else if relative_size > p.moderate_size {
            (Severity::Moderate, 0.65)
        } else {
            (Severity::Moderate, 0.60)
        };
        if p.high_risk_labels.iter().any(|l| *l == label) {
            confidence += p.high_risk_bonus;
        }

        let object_name = display_name(label);
        let mut description = format!("{} detected in potential pathway area", object_name);
        if relative_size > p.mention_size {
            description.push_str(&format!(" (occupies {:.0}% of the frame)", relative_size * 100.0));
        }
        description.push_str(
            ". Objects may not protrude into accessible routes or reduce required 36-inch clear width.",
        );

        ViolationRecord::new("Pathway Obstruction", severity, "403.5.1")
            .with_description(description)
            .with_recommendation(format!(
                "Relocate {} to maintain minimum 36-inch clear pathway width. Ensure objects do not protrude more than 4 inches into circulation path (ADA 307).",
                object_name.to_lowercase()
            ))
            .with_confidence(confidence.min(p.max_confidence))
            .with_measurement("relative_size_percentage", round_to(relative_size * 100.0, 1))
            .with_measurement("required_clear_width_inches", 36.0)
            .with_measurement("max_protrusion_inches", 4.0)
    }
}

/// "potted_plant" -> "Potted plant"
fn display_name(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl CategoryAnalyzer for PathwayAnalyzer {
    fn name(&self) -> &'static str {
        "pathway"
    }

    fn analyze(&self, region: &RgbImage, context: &DetectionContext<'_>) -> Vec<ViolationRecord> {
        if is_empty_region(region) {
            return Vec::new();
        }

        let label = normalize_label(&context.detection.label);
        if !self.params.obstruction_labels.iter().any(|l| *l == label) {
            return Vec::new();
        }

        // only the part of the box inside the frame counts
        let frame_area = context.frame_area();
        let visible_area = context
            .detection
            .bbox
            .clamp_to(context.frame_width, context.frame_height)
            .map(|(_, _, w, h)| w as u64 * h as u64)
            .unwrap_or(0);
        let relative_size = if frame_area > 0 {
            (visible_area as f64 / frame_area as f64).min(1.0)
        } else {
            0.0
        };

        vec![self.check_obstruction(&label, relative_size)]
    }
}

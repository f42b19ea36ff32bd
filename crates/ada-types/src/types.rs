//! Shared data model: detections, violation records, severity taxonomy

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Detection method tag for the heuristic computer-vision analyzers
pub const RULE_BASED_METHOD: &str = "rule_based_cv";

/// Detection method tag for the model-backed analyzer
pub const MODEL_METHOD: &str = "model_api";

/// Named numeric measurements supporting a finding
pub type Measurements = BTreeMap<String, f64>;

/// Coarse priority ranking of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Moderate,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Moderate, Severity::Minor];

    /// Case-exact wire label
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Moderate => "Moderate",
            Severity::Minor => "Minor",
        }
    }

    /// Lower rank sorts first in reports
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Moderate => 1,
            Severity::Minor => 2,
        }
    }

    /// Parse free-form severity text from an external model.
    ///
    /// Matching is case-insensitive; anything unrecognized yields `None`.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "critical" | "high" => Some(Severity::Critical),
            "moderate" | "medium" => Some(Severity::Moderate),
            "minor" | "low" => Some(Severity::Minor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Axis-aligned box in pixel units, origin top-left.
///
/// Serialized as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[i64; 4]")]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add((self.width / 2) as i32),
            self.y.saturating_add((self.height / 2) as i32),
        )
    }

    /// Intersect with a `frame_width` x `frame_height` image.
    ///
    /// Returns `(x, y, width, height)` of the visible part, or `None` when
    /// nothing of the box lies inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(frame_width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(frame_height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = String;

    fn try_from(value: [f64; 4]) -> Result<Self, Self::Error> {
        let [x, y, w, h] = value;
        if value.iter().any(|v| !v.is_finite()) {
            return Err("bounding box values must be finite".to_string());
        }
        if w < 0.0 || h < 0.0 {
            return Err(format!("bounding box has negative size ({} x {})", w, h));
        }
        Ok(Self {
            x: x.round() as i32,
            y: y.round() as i32,
            width: w.round() as u32,
            height: h.round() as u32,
        })
    }
}

impl From<BoundingBox> for [i64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x as i64, b.y as i64, b.width as i64, b.height as i64]
    }
}

/// A located, classified candidate object produced by an external detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Category label as reported by the detector
    #[serde(alias = "class_name")]
    pub label: String,
    /// Detector confidence in [0, 1]
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence: clamp_unit(confidence),
            bbox,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        self.bbox.center()
    }
}

/// A single suspected non-compliance finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    #[serde(rename = "type")]
    pub violation_type: String,
    pub severity: Severity,
    pub ada_code: String,
    pub description: String,
    pub recommendation: String,
    /// Analyzer's own certainty in [0, 1]
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f64,
    pub detection_method: String,
    #[serde(default)]
    pub measurements: Measurements,
}

impl ViolationRecord {
    /// Start a record with the fields every finding carries.
    ///
    /// Confidence defaults to 0.5 and the method to the rule-based tag.
    pub fn new(violation_type: impl Into<String>, severity: Severity, ada_code: impl Into<String>) -> Self {
        Self {
            violation_type: violation_type.into(),
            severity,
            ada_code: ada_code.into(),
            description: String::new(),
            recommendation: String::new(),
            confidence: 0.5,
            detection_method: RULE_BASED_METHOD.to_string(),
            measurements: Measurements::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.detection_method = method.into();
        self
    }

    /// Attach a measurement; non-finite values are dropped
    pub fn with_measurement(mut self, name: &str, value: f64) -> Self {
        if value.is_finite() {
            self.measurements.insert(name.to_string(), value);
        }
        self
    }
}

/// Clamp to [0, 1]; NaN maps to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Round to a fixed number of decimals for reported measurements
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_labels_are_case_exact() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"Critical\"");
        assert_eq!(serde_json::to_string(&Severity::Moderate).unwrap(), "\"Moderate\"");
        assert_eq!(serde_json::to_string(&Severity::Minor).unwrap(), "\"Minor\"");
    }

    #[test]
    fn test_severity_parse_lenient() {
        assert_eq!(Severity::parse_lenient(" CRITICAL "), Some(Severity::Critical));
        assert_eq!(Severity::parse_lenient("moderate"), Some(Severity::Moderate));
        assert_eq!(Severity::parse_lenient("severe-ish"), None);
    }

    #[test]
    fn test_bbox_clamp() {
        let b = BoundingBox::new(-10, 5, 50, 20);
        assert_eq!(b.clamp_to(30, 100), Some((0, 5, 30, 20)));
        let outside = BoundingBox::new(200, 200, 10, 10);
        assert_eq!(outside.clamp_to(100, 100), None);
        let empty = BoundingBox::new(0, 0, 0, 10);
        assert_eq!(empty.clamp_to(100, 100), None);
    }

    #[test]
    fn test_detection_deserialize_alias_and_clamp() {
        let json = r#"{"class_name": "door", "confidence": 1.7, "bbox": [10.4, 20, 30, 40.6]}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.label, "door");
        assert_eq!(det.confidence, 1.0);
        assert_eq!(det.bbox, BoundingBox::new(10, 20, 30, 41));
        assert_eq!(det.center(), (25, 40));
    }

    #[test]
    fn test_negative_bbox_rejected() {
        let json = r#"{"label": "door", "confidence": 0.5, "bbox": [0, 0, -3, 4]}"#;
        assert!(serde_json::from_str::<Detection>(json).is_err());
    }

    #[test]
    fn test_violation_record_serializes_flat() {
        let record = ViolationRecord::new("Door Width", Severity::Critical, "404.2.3")
            .with_confidence(1.4)
            .with_measurement("aspect_ratio", 2.8)
            .with_measurement("bogus", f64::NAN);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "Door Width");
        assert_eq!(value["severity"], "Critical");
        assert_eq!(value["confidence"], 1.0);
        assert_eq!(value["detection_method"], RULE_BASED_METHOD);
        assert_eq!(value["measurements"]["aspect_ratio"], 2.8);
        assert!(value["measurements"].get("bogus").is_none());
    }
}

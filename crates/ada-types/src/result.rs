//! Per-image analysis result produced by the aggregator

use crate::types::{BoundingBox, Detection, Severity, ViolationRecord};
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Whether a detection was analyzed or its analysis failed.
///
/// A failed detection carries an empty violation list; the status is what
/// distinguishes it from a compliant finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetectionStatus {
    Analyzed,
    Failed { reason: String },
}

impl DetectionStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, DetectionStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analyzer_type: String,
    pub detection_index: usize,
}

/// One detection and the violations found for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    #[serde(skip)]
    pub key: String,
    pub object: String,
    pub bbox: BoundingBox,
    pub detector_confidence: f64,
    pub violations: Vec<ViolationRecord>,
    pub status: DetectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub analysis_metadata: AnalysisMetadata,
}

impl DetectionReport {
    pub fn new(index: usize, detection: &Detection, analyzer_type: &str) -> Self {
        Self {
            key: detection_key(index),
            object: detection.label.clone(),
            bbox: detection.bbox,
            detector_confidence: detection.confidence,
            violations: Vec::new(),
            status: DetectionStatus::Analyzed,
            overall_assessment: None,
            notes: None,
            analysis_metadata: AnalysisMetadata {
                analyzer_type: analyzer_type.to_string(),
                detection_index: index,
            },
        }
    }

    /// Violations ordered Critical first, then by descending confidence
    pub fn violations_by_severity(&self) -> Vec<&ViolationRecord> {
        let mut sorted: Vec<&ViolationRecord> = self.violations.iter().collect();
        sorted.sort_by(|a, b| {
            a.severity
                .rank()
                .cmp(&b.severity.rank())
                .then(b.confidence.total_cmp(&a.confidence))
        });
        sorted
    }
}

/// Stable per-detection key
pub fn detection_key(index: usize) -> String {
    format!("detection_{}", index)
}

/// Analysis of every detection in one image, in input order
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub audit_id: String,
    pub analyzer_type: String,
    pub analyzed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(serialize_with = "serialize_entries")]
    pub detections: Vec<DetectionReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl AnalysisResult {
    pub fn new(analyzer_type: &str, frame_width: u32, frame_height: u32) -> Self {
        Self {
            audit_id: uuid::Uuid::new_v4().to_string(),
            analyzer_type: analyzer_type.to_string(),
            analyzed_at: Utc::now(),
            image: None,
            frame_width,
            frame_height,
            detections: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn violations(&self) -> impl Iterator<Item = &ViolationRecord> {
        self.detections.iter().flat_map(|d| d.violations.iter())
    }

    pub fn total_violations(&self) -> usize {
        self.violations().count()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.violations().filter(|v| v.severity == severity).count()
    }

    pub fn failed_detections(&self) -> usize {
        self.detections.iter().filter(|d| d.status.is_failed()).count()
    }

    pub fn get(&self, key: &str) -> Option<&DetectionReport> {
        self.detections.iter().find(|d| d.key == key)
    }
}

/// Serialize detections as a key -> report map, keeping input order
#[allow(clippy::ptr_arg)]
fn serialize_entries<S>(entries: &Vec<DetectionReport>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for entry in entries {
        map.serialize_entry(&entry.key, entry)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, label: &str) -> DetectionReport {
        let det = Detection::new(label, 0.9, BoundingBox::new(1, 2, 3, 4));
        DetectionReport::new(index, &det, "rule_based_cv")
    }

    #[test]
    fn test_entries_serialize_in_input_order() {
        let mut result = AnalysisResult::new("rule_based_cv", 640, 480);
        for i in 0..12 {
            result.detections.push(report(i, "chair"));
        }
        let json = serde_json::to_string(&result).unwrap();
        let pos2 = json.find("\"detection_2\"").unwrap();
        let pos10 = json.find("\"detection_10\"").unwrap();
        assert!(pos2 < pos10);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &value["detections"]["detection_3"];
        assert_eq!(entry["object"], "chair");
        assert_eq!(entry["bbox"], serde_json::json!([1, 2, 3, 4]));
        assert_eq!(entry["status"]["state"], "analyzed");
        assert_eq!(entry["analysis_metadata"]["detection_index"], 3);
    }

    #[test]
    fn test_violations_by_severity() {
        let mut entry = report(0, "door");
        entry.violations.push(ViolationRecord::new("Door Hardware", Severity::Minor, "404.2.7"));
        entry.violations.push(ViolationRecord::new("Door Width", Severity::Critical, "404.2.3"));
        entry.violations.push(ViolationRecord::new("Door Threshold", Severity::Moderate, "404.2.5"));
        let ordered: Vec<&str> = entry
            .violations_by_severity()
            .iter()
            .map(|v| v.violation_type.as_str())
            .collect();
        assert_eq!(ordered, vec!["Door Width", "Door Threshold", "Door Hardware"]);
    }
}

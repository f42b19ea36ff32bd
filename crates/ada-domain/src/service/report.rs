//! Severity summary and text audit report

use serde::{Deserialize, Serialize};

use crate::model::lookup;
use ada_types::{AnalysisResult, DetectionStatus, Severity};

/// Violation counts for one analyzed image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub objects: usize,
    pub failed: usize,
    pub critical: usize,
    pub moderate: usize,
    pub minor: usize,
    pub total: usize,
}

impl SeveritySummary {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let mut summary = Self {
            objects: result.detections.len(),
            failed: result.failed_detections(),
            ..Default::default()
        };
        for violation in result.violations() {
            match violation.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Moderate => summary.moderate += 1,
                Severity::Minor => summary.minor += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Sum per-image summaries for batch runs
    pub fn merge(&mut self, other: &SeveritySummary) {
        self.objects += other.objects;
        self.failed += other.failed;
        self.critical += other.critical;
        self.moderate += other.moderate;
        self.minor += other.minor;
        self.total += other.total;
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }
}

pub fn generate_audit_report(result: &AnalysisResult) -> String {
    let summary = SeveritySummary::from_result(result);

    let mut report = String::new();
    report.push_str("==================================================\n");
    report.push_str("        ACCESSIBILITY COMPLIANCE AUDIT REPORT     \n");
    report.push_str("==================================================\n\n");
    if let Some(ref image) = result.image {
        report.push_str(&format!("  Image:             {}\n", image));
    }
    report.push_str(&format!(
        "  Frame:             {} x {}\n",
        result.frame_width, result.frame_height
    ));
    report.push_str(&format!("  Analyzer:          {}\n", result.analyzer_type));
    report.push_str(&format!(
        "  Analyzed at:       {}\n\n",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("[Summary]\n");
    report.push_str(&format!("  Objects analyzed:  {}\n", summary.objects));
    report.push_str(&format!("  Total violations:  {}\n", summary.total));
    report.push_str(&format!("  Critical:          {}\n", summary.critical));
    report.push_str(&format!("  Moderate:          {}\n", summary.moderate));
    report.push_str(&format!("  Minor:             {}\n", summary.minor));
    if summary.failed > 0 {
        report.push_str(&format!("  Analysis failed:   {}\n", summary.failed));
    }
    report.push('\n');

    for entry in &result.detections {
        report.push_str(&format!(
            "[{}] {} at ({}, {}) {}x{}\n",
            entry.key,
            entry.object,
            entry.bbox.x,
            entry.bbox.y,
            entry.bbox.width,
            entry.bbox.height
        ));
        report.push_str("-".repeat(50).as_str());
        report.push('\n');

        if let DetectionStatus::Failed { ref reason } = entry.status {
            report.push_str(&format!("  ANALYSIS FAILED: {}\n\n", reason));
            continue;
        }

        if entry.violations.is_empty() {
            report.push_str("  No violations detected\n");
        }

        for violation in entry.violations_by_severity() {
            let title = lookup(&violation.ada_code)
                .map(|c| format!(" ({})", c.title))
                .unwrap_or_default();
            report.push_str(&format!(
                "  {:<9} {:<22} ADA {}{}  conf {:>3.0}%\n",
                violation.severity.label(),
                truncate_str(&violation.violation_type, 22),
                violation.ada_code,
                title,
                violation.confidence * 100.0
            ));
            if !violation.description.is_empty() {
                report.push_str(&format!("            {}\n", violation.description));
            }
            if !violation.recommendation.is_empty() {
                report.push_str(&format!("            Fix: {}\n", violation.recommendation));
            }
        }

        if let Some(ref notes) = entry.notes {
            report.push_str(&format!("  Notes: {}\n", notes));
        }
        report.push('\n');
    }

    for note in &result.notes {
        report.push_str(&format!("Note: {}\n", note));
    }

    report.push_str("==================================================\n");
    report.push_str("Findings are visual estimates; verify with physical measurement.\n");
    report
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(2)).collect();
        format!("{}..", truncated)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_types::{BoundingBox, Detection, DetectionReport, ViolationRecord};

    fn sample_result() -> AnalysisResult {
        let mut result = AnalysisResult::new("rule_based_cv", 640, 480);

        let door = Detection::new("door", 0.8, BoundingBox::new(10, 10, 80, 300));
        let mut entry = DetectionReport::new(0, &door, "rule_based_cv");
        entry.violations.push(
            ViolationRecord::new("Door Width", Severity::Critical, "404.2.3")
                .with_confidence(0.7)
                .with_description("narrow"),
        );
        entry.violations.push(ViolationRecord::new("Door Hardware", Severity::Minor, "404.2.7"));
        result.detections.push(entry);

        let chair = Detection::new("chair", 0.6, BoundingBox::new(200, 200, 50, 50));
        let mut failed = DetectionReport::new(1, &chair, "rule_based_cv");
        failed.status = DetectionStatus::Failed {
            reason: "backend unavailable".to_string(),
        };
        result.detections.push(failed);

        result
    }

    #[test]
    fn test_summary_counts() {
        let summary = SeveritySummary::from_result(&sample_result());
        assert_eq!(summary.objects, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.minor, 1);
        assert_eq!(summary.total, 2);

        let mut total = SeveritySummary::default();
        total.merge(&summary);
        total.merge(&summary);
        assert_eq!(total.count(Severity::Critical), 2);
    }

    #[test]
    fn test_report_contents() {
        let report = generate_audit_report(&sample_result());
        assert!(report.contains("Total violations:  2"));
        assert!(report.contains("ADA 404.2.3 (Clear Width)"));
        assert!(report.contains("ANALYSIS FAILED: backend unavailable"));
        let critical = report.find("Door Width").unwrap();
        let minor = report.find("Door Hardware").unwrap();
        assert!(critical < minor);
    }
}

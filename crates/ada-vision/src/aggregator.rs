//! Runs an analyzer over every detection in one image

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ada_types::{AnalysisResult, Detection, DetectionReport, DetectionStatus};
use image::RgbImage;
use tracing::{info, warn};

use crate::{AnalysisOutcome, ComplianceAnalyzer};

/// Analyze all detections in input order.
///
/// The result holds exactly one entry per detection. A detection whose
/// analysis fails (or panics) is recorded as failed with no violations and
/// a note on the result; the remaining detections are still analyzed.
pub fn analyze_all(analyzer: &dyn ComplianceAnalyzer, image: &RgbImage, detections: &[Detection]) -> AnalysisResult {
    let mut result = AnalysisResult::new(analyzer.name(), image.width(), image.height());

    for (index, detection) in detections.iter().enumerate() {
        let mut entry = DetectionReport::new(index, detection, analyzer.name());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze_detection(image, detection)))
            .unwrap_or_else(|payload| AnalysisOutcome::failed(format!("analyzer panicked: {}", panic_message(payload.as_ref()))));

        match outcome {
            AnalysisOutcome::Completed {
                violations,
                overall_assessment,
                notes,
            } => {
                entry.violations = violations;
                entry.overall_assessment = overall_assessment;
                entry.notes = notes;
            }
            AnalysisOutcome::Failed { diagnostic } => {
                warn!(detection = %entry.key, label = %detection.label, "analysis failed: {}", diagnostic);
                result.notes.push(format!("{}: {}", entry.key, diagnostic));
                entry.status = DetectionStatus::Failed { reason: diagnostic };
            }
        }

        result.detections.push(entry);
    }

    info!(
        analyzer = analyzer.name(),
        detections = result.detections.len(),
        violations = result.total_violations(),
        failed = result.failed_detections(),
        "image analyzed"
    );
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Vision module - rule-based and model-backed accessibility analysis

pub mod aggregator;
pub mod ai;
pub mod annotate;
pub mod analyzers;
pub mod imaging;
pub mod router;

// Re-export main types for convenience
pub use aggregator::analyze_all;
pub use annotate::{annotate, with_summary_panel};
pub use ai::backend_impl::{AnthropicBackend, BackendError, CommandBackend, MockBackend, ModelBackend, ModelRequest};
pub use ai::cache::ResponseCache;
pub use ai::response::{extract_json_payload, extract_model_response, ExtractError, ModelResponse};
pub use ai::ModelAnalyzer;
pub use router::{normalize_label, Category, RuleBasedAnalyzer};

use ada_types::{Detection, ViolationRecord};
use image::RgbImage;

/// Result of analyzing one detection.
///
/// `Failed` keeps a failed external call apart from a compliant finding;
/// both carry no violations.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed {
        violations: Vec<ViolationRecord>,
        overall_assessment: Option<String>,
        notes: Option<String>,
    },
    Failed {
        diagnostic: String,
    },
}

impl AnalysisOutcome {
    pub fn completed(violations: Vec<ViolationRecord>) -> Self {
        AnalysisOutcome::Completed {
            violations,
            overall_assessment: None,
            notes: None,
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        AnalysisOutcome::Failed {
            diagnostic: diagnostic.into(),
        }
    }

    pub fn violations(&self) -> &[ViolationRecord] {
        match self {
            AnalysisOutcome::Completed { violations, .. } => violations,
            AnalysisOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }
}

/// Produces violation records for one detection in a full image
pub trait ComplianceAnalyzer: Send + Sync {
    /// Analyzer type recorded in result metadata
    fn name(&self) -> &'static str;

    fn analyze_detection(&self, image: &RgbImage, detection: &Detection) -> AnalysisOutcome;
}

//! Audit Service - core use case for auditing one image
//!
//! This service orchestrates the audit workflow:
//! 1. Validate and decode the input image
//! 2. Resolve and load its detections
//! 3. Drop detections below the confidence floor
//! 4. Run the selected analyzer over every detection
//! 5. Return the per-detection result

use crate::config::Config;
use crate::detector::{filter_by_confidence, sidecar_path, DetectionSource};
use crate::scanner::load_rgb_image;
use ada_types::{AnalysisResult, AnalyzerKind, Error, ModelBackendKind};
use ada_vision::{
    analyze_all, AnthropicBackend, CommandBackend, ComplianceAnalyzer, MockBackend, ModelAnalyzer,
    ModelBackend, ResponseCache, RuleBasedAnalyzer,
};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors specific to the audit service
#[derive(Debug, Error)]
pub enum AuditServiceError {
    #[error("Image validation failed: {0}")]
    InvalidImage(String),

    #[error("Detections unavailable: {0}")]
    Detections(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<Error> for AuditServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::FileNotFound(msg) | Error::InvalidImageFormat(msg) => {
                AuditServiceError::InvalidImage(msg)
            }
            Error::Image(e) => AuditServiceError::InvalidImage(e.to_string()),
            Error::InvalidDetections(msg) | Error::Detector(msg) => {
                AuditServiceError::Detections(msg)
            }
            Error::AnalysisFailed(msg) => AuditServiceError::AnalysisFailed(msg),
            Error::Cache(e) => AuditServiceError::CacheError(e.to_string()),
            Error::Config(e) => AuditServiceError::ConfigError(e.to_string()),
            _ => AuditServiceError::AnalysisFailed(err.to_string()),
        }
    }
}

/// Options for an audit
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Analyzer override; the config value is used when unset
    pub analyzer: Option<AnalyzerKind>,

    /// Explicit detection source; resolved per image when unset
    pub detections: Option<DetectionSource>,

    /// Confidence floor override
    pub min_confidence: Option<f64>,

    /// Whether to use the model response cache
    pub use_cache: bool,
}

impl AuditOptions {
    pub fn new() -> Self {
        Self {
            use_cache: true,
            ..Default::default()
        }
    }

    pub fn with_analyzer(mut self, kind: AnalyzerKind) -> Self {
        self.analyzer = Some(kind);
        self
    }

    pub fn with_detections(mut self, source: DetectionSource) -> Self {
        self.detections = Some(source);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }
}

/// Build the analyzer selected by `kind`
pub fn build_analyzer(
    config: &Config,
    kind: AnalyzerKind,
    use_cache: bool,
) -> Result<Box<dyn ComplianceAnalyzer>, AuditServiceError> {
    match kind {
        AnalyzerKind::RuleBased => Ok(Box::new(RuleBasedAnalyzer::new())),
        AnalyzerKind::Model => {
            let backend: Box<dyn ModelBackend> = match config.model_backend {
                ModelBackendKind::Mock => Box::new(MockBackend),
                ModelBackendKind::Command => {
                    let command = config.model_command.as_deref().ok_or_else(|| {
                        AuditServiceError::ConfigError(
                            "model_command is required for the command backend".to_string(),
                        )
                    })?;
                    Box::new(CommandBackend::new(command).with_model(config.model.clone()))
                }
                ModelBackendKind::Anthropic => Box::new(
                    AnthropicBackend::from_env(&config.api_key_env, config.model.clone())
                        .map_err(|e| AuditServiceError::ConfigError(e.to_string()))?,
                ),
            };

            let cache = if use_cache && config.cache_enabled {
                Some(ResponseCache::new(config.cache_dir()?.join("responses"))?)
            } else {
                None
            };

            debug!(backend = backend.name(), cached = cache.is_some(), "model analyzer ready");
            Ok(Box::new(ModelAnalyzer::new(backend).with_cache(cache)))
        }
    }
}

/// Pick the detection source for one image.
///
/// An explicit source wins, then a sidecar `<image>.detections.json`, then
/// the configured detector command.
pub fn resolve_detection_source(
    image_path: &Path,
    config: &Config,
    explicit: Option<&DetectionSource>,
) -> Result<DetectionSource, AuditServiceError> {
    if let Some(source) = explicit {
        return Ok(source.clone());
    }

    let sidecar = sidecar_path(image_path);
    if sidecar.is_file() {
        return Ok(DetectionSource::File(sidecar));
    }

    if let Some(ref command) = config.detector_command {
        return Ok(DetectionSource::Command(command.clone()));
    }

    Err(AuditServiceError::Detections(format!(
        "no detections for {}: pass --detections, add {} or configure a detector command",
        image_path.display(),
        sidecar.display()
    )))
}

/// Audits images with one analyzer built from config and options
pub struct Auditor {
    config: Config,
    analyzer: Box<dyn ComplianceAnalyzer>,
    detections: Option<DetectionSource>,
    min_confidence: f64,
}

impl Auditor {
    pub fn new(config: &Config, options: &AuditOptions) -> Result<Self, AuditServiceError> {
        config.validate()?;
        let kind = options.analyzer.unwrap_or(config.analyzer);
        let analyzer = build_analyzer(config, kind, options.use_cache)?;
        Ok(Self::with_analyzer(config, options, analyzer))
    }

    /// Use a caller-supplied analyzer instead of building one from config
    pub fn with_analyzer(
        config: &Config,
        options: &AuditOptions,
        analyzer: Box<dyn ComplianceAnalyzer>,
    ) -> Self {
        Self {
            config: config.clone(),
            analyzer,
            detections: options.detections.clone(),
            min_confidence: options
                .min_confidence
                .unwrap_or(config.min_detection_confidence),
        }
    }

    pub fn analyzer_name(&self) -> &'static str {
        self.analyzer.name()
    }

    /// Audit one image
    pub fn audit(&self, image_path: &Path) -> Result<AnalysisResult, AuditServiceError> {
        let image = load_rgb_image(image_path)?;

        let source = resolve_detection_source(image_path, &self.config, self.detections.as_ref())?;
        debug!(image = %image_path.display(), source = %source, "loading detections");
        let detections = source.detect(image_path)?;
        let total = detections.len();
        let detections = filter_by_confidence(detections, self.min_confidence);
        if detections.is_empty() && total > 0 {
            warn!(
                image = %image_path.display(),
                total,
                min_confidence = self.min_confidence,
                "all detections below confidence floor"
            );
        }

        let mut result = analyze_all(self.analyzer.as_ref(), &image, &detections);
        result.image = Some(image_path.display().to_string());
        Ok(result)
    }
}

/// Audit a single image using config and options
pub fn audit_image(
    image_path: &Path,
    config: &Config,
    options: &AuditOptions,
) -> Result<AnalysisResult, AuditServiceError> {
    Auditor::new(config, options)?.audit(image_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        let err: AuditServiceError = Error::FileNotFound("x.jpg".to_string()).into();
        assert!(matches!(err, AuditServiceError::InvalidImage(_)));

        let err: AuditServiceError = Error::Detector("boom".to_string()).into();
        assert!(matches!(err, AuditServiceError::Detections(_)));

        let err: AuditServiceError =
            Error::Config(ada_types::ConfigError::InvalidValue("x".to_string())).into();
        assert!(matches!(err, AuditServiceError::ConfigError(_)));
    }

    #[test]
    fn test_source_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shop.png");
        let config = Config {
            detector_command: Some("detect --fast".to_string()),
            ..Config::default()
        };

        assert_eq!(
            resolve_detection_source(&image, &config, None).unwrap(),
            DetectionSource::Command("detect --fast".to_string())
        );

        let sidecar = sidecar_path(&image);
        std::fs::write(&sidecar, "[]").unwrap();
        assert_eq!(
            resolve_detection_source(&image, &config, None).unwrap(),
            DetectionSource::File(sidecar)
        );

        let explicit = DetectionSource::File(dir.path().join("other.json"));
        assert_eq!(
            resolve_detection_source(&image, &config, Some(&explicit)).unwrap(),
            explicit
        );
    }

    #[test]
    fn test_no_source_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_detection_source(&dir.path().join("a.png"), &Config::default(), None)
            .unwrap_err();
        assert!(matches!(err, AuditServiceError::Detections(_)));
    }

    #[test]
    fn test_build_analyzer_by_kind() {
        let config = Config::default();
        let rule_based = build_analyzer(&config, AnalyzerKind::RuleBased, false).unwrap();
        assert_eq!(rule_based.name(), ada_types::RULE_BASED_METHOD);

        let model = build_analyzer(&config, AnalyzerKind::Model, false).unwrap();
        assert_eq!(model.name(), ada_types::MODEL_METHOD);
    }

    #[test]
    fn test_command_backend_requires_command() {
        let config = Config {
            model_backend: ModelBackendKind::Command,
            ..Config::default()
        };
        assert!(matches!(
            build_analyzer(&config, AnalyzerKind::Model, false),
            Err(AuditServiceError::ConfigError(_))
        ));
    }

    #[test]
    fn test_anthropic_backend_requires_key() {
        let config = Config {
            model_backend: ModelBackendKind::Anthropic,
            api_key_env: "ADA_CHECKER_TEST_NO_SUCH_KEY".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            build_analyzer(&config, AnalyzerKind::Model, false),
            Err(AuditServiceError::ConfigError(_))
        ));
    }
}

//! Model-backed analyzer: prompts a multimodal model with the detection crop

pub mod backend_impl;
pub mod cache;
pub mod prompts;
pub mod response;

use std::io::Cursor;

use ada_types::{Detection, MODEL_METHOD};
use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, warn};

use crate::imaging::{crop_region, is_empty_region};
use crate::{AnalysisOutcome, ComplianceAnalyzer};
use backend_impl::{ModelBackend, ModelRequest};
use cache::ResponseCache;
use prompts::build_detection_prompt;
use response::{extract_json_payload, parse_model_response};

pub struct ModelAnalyzer {
    backend: Box<dyn ModelBackend>,
    cache: Option<ResponseCache>,
}

impl ModelAnalyzer {
    pub fn new(backend: Box<dyn ModelBackend>) -> Self {
        Self { backend, cache: None }
    }

    pub fn with_cache(mut self, cache: Option<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn cache_key(&self, request: &ModelRequest<'_>) -> Option<String> {
        self.cache
            .as_ref()
            .map(|_| ResponseCache::cache_key(request.prompt, request.image_jpeg))
    }

    fn cached_reply(&self, key: Option<&str>, label: &str) -> Option<String> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        match cache.get(key) {
            Ok(Some(text)) => {
                debug!(label, "model response cache hit");
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }

    /// Only replies that yielded a JSON payload are stored
    fn store_reply(&self, key: Option<&str>, label: &str, text: &str) {
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if let Err(e) = cache.set(key, label, text) {
                warn!("failed to cache model response: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for ModelAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAnalyzer")
            .field("backend", &self.backend.name())
            .field("cache", &self.cache)
            .finish()
    }
}

fn encode_jpeg(region: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(region.clone()).write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(buffer.into_inner())
}

impl ComplianceAnalyzer for ModelAnalyzer {
    fn name(&self) -> &'static str {
        MODEL_METHOD
    }

    fn analyze_detection(&self, image: &RgbImage, detection: &Detection) -> AnalysisOutcome {
        let region = crop_region(image, &detection.bbox);
        if is_empty_region(&region) {
            return AnalysisOutcome::completed(Vec::new());
        }

        let image_jpeg = match encode_jpeg(&region) {
            Ok(bytes) => bytes,
            Err(e) => return AnalysisOutcome::failed(format!("failed to encode crop: {}", e)),
        };
        let prompt = build_detection_prompt(&detection.label);
        let request = ModelRequest {
            label: &detection.label,
            prompt: &prompt,
            image_jpeg: &image_jpeg,
        };

        let key = self.cache_key(&request);
        let (text, from_cache) = match self.cached_reply(key.as_deref(), request.label) {
            Some(text) => (text, true),
            None => match self.backend.complete(&request) {
                Ok(text) => (text, false),
                Err(e) => {
                    return AnalysisOutcome::failed(format!("{} backend failed: {}", self.backend.name(), e))
                }
            },
        };

        match extract_json_payload(&text) {
            Ok(payload) => {
                if !from_cache {
                    self.store_reply(key.as_deref(), request.label, &text);
                }
                let response = parse_model_response(&payload);
                debug!(
                    label = %detection.label,
                    violations = response.violations.len(),
                    "model response parsed"
                );
                AnalysisOutcome::Completed {
                    violations: response.violations,
                    overall_assessment: Some(response.overall_assessment).filter(|s| !s.is_empty()),
                    notes: Some(response.notes).filter(|s| !s.is_empty()),
                }
            }
            Err(e) => {
                let excerpt: String = text.trim().chars().take(200).collect();
                AnalysisOutcome::failed(format!("unparseable model response ({}): {}", e, excerpt))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::backend_impl::{BackendError, MockBackend};
    use ada_types::{BoundingBox, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ScriptedBackend {
        reply: Result<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl ModelBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(&self, _request: &ModelRequest<'_>) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(BackendError::Http)
        }
    }

    fn scripted(reply: Result<&str, &str>) -> (ModelAnalyzer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = ScriptedBackend {
            reply: reply.map(str::to_string).map_err(str::to_string),
            calls: calls.clone(),
        };
        (ModelAnalyzer::new(Box::new(backend)), calls)
    }

    fn door() -> Detection {
        Detection::new("door", 0.9, BoundingBox::new(10, 10, 40, 80))
    }

    #[test]
    fn test_mock_door() {
        let analyzer = ModelAnalyzer::new(Box::new(MockBackend));
        let outcome = analyzer.analyze_detection(&RgbImage::new(100, 100), &door());
        match outcome {
            AnalysisOutcome::Completed {
                violations,
                overall_assessment,
                notes,
            } => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].severity, Severity::Critical);
                assert_eq!(violations[0].detection_method, MODEL_METHOD);
                assert_eq!(overall_assessment.as_deref(), Some("Potential door width violation"));
                assert!(notes.is_some());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_backend_error_is_explicit_failure() {
        let (analyzer, _) = scripted(Err("connection refused"));
        let outcome = analyzer.analyze_detection(&RgbImage::new(100, 100), &door());
        assert!(outcome.is_failed());
        assert!(outcome.violations().is_empty());
        match outcome {
            AnalysisOutcome::Failed { diagnostic } => assert!(diagnostic.contains("connection refused")),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unparseable_response_is_failure() {
        let (analyzer, _) = scripted(Ok("Sorry, I can't help with that."));
        let outcome = analyzer.analyze_detection(&RgbImage::new(100, 100), &door());
        assert!(outcome.is_failed());
    }

    #[test]
    fn test_empty_crop_skips_backend() {
        let (analyzer, calls) = scripted(Ok("{}"));
        let outside = Detection::new("door", 0.9, BoundingBox::new(500, 500, 10, 10));
        let outcome = analyzer.analyze_detection(&RgbImage::new(100, 100), &outside);
        assert_eq!(outcome, AnalysisOutcome::completed(Vec::new()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unparseable_reply_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().to_path_buf()).unwrap();
        let (analyzer, calls) = scripted(Ok("The image is too dark to assess."));
        let analyzer = analyzer.with_cache(Some(cache.clone()));
        let image = RgbImage::new(100, 100);

        assert!(analyzer.analyze_detection(&image, &door()).is_failed());
        assert!(analyzer.analyze_detection(&image, &door()).is_failed());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_cache_avoids_second_call() {
        let dir = tempfile::tempdir().unwrap();
        let (analyzer, calls) = scripted(Ok(r#"{"violations": [{"type": "Threshold"}], "notes": ""}"#));
        let analyzer = analyzer.with_cache(Some(ResponseCache::new(dir.path().to_path_buf()).unwrap()));
        let image = RgbImage::new(100, 100);

        let first = analyzer.analyze_detection(&image, &door());
        let second = analyzer.analyze_detection(&image, &door());
        assert_eq!(first, second);
        assert_eq!(first.violations()[0].violation_type, "Threshold");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Detection sources: JSON files and external detector commands
//!
//! Object detection happens outside this crate. Detections arrive as a JSON
//! array of `{label, confidence, bbox: [x, y, w, h]}` entries, either read
//! from a file or printed by a detector command on stdout.

use ada_types::{Detection, Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Suffix appended to an image file name for its detections file
pub const SIDECAR_SUFFIX: &str = ".detections.json";

/// Where detections for an image come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionSource {
    /// JSON file holding the detections
    File(PathBuf),
    /// Detector command line, run with `--image <path>` appended
    Command(String),
}

impl DetectionSource {
    /// Load detections for `image_path`
    pub fn detect(&self, image_path: &Path) -> Result<Vec<Detection>> {
        match self {
            DetectionSource::File(path) => load_detections_file(path),
            DetectionSource::Command(command) => run_detector(command, image_path),
        }
    }
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionSource::File(path) => write!(f, "file {}", path.display()),
            DetectionSource::Command(command) => write!(f, "command `{}`", command),
        }
    }
}

/// `photo.jpg` -> `photo.jpg.detections.json`
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let mut name = image_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(SIDECAR_SUFFIX);
    image_path.with_file_name(name)
}

pub fn load_detections_file(path: &Path) -> Result<Vec<Detection>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_detections(&content)
        .map_err(|e| Error::InvalidDetections(format!("{}: {}", path.display(), e)))
}

/// Parse detections from JSON text.
///
/// Accepts a bare array or an object with a `detections` array. Text
/// around the JSON (log lines, code fences) is tolerated.
pub fn parse_detections(text: &str) -> Result<Vec<Detection>> {
    let value = locate_json(text)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("detections") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(Error::InvalidDetections(
                    "expected an array of detections".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::InvalidDetections(
                "expected an array of detections".to_string(),
            ))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| Error::InvalidDetections(format!("entry {}: {}", i, e)))
        })
        .collect()
}

fn locate_json(text: &str) -> Result<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidDetections("no detections output".to_string()));
    }

    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    // Scan each `[` / `{` and keep the first value shaped like detections.
    // Log prefixes such as `[INFO]` fail to parse and are skipped.
    for (start, _) in text.match_indices(['[', '{']) {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            if looks_like_detections(&value) {
                return Ok(value);
            }
        }
    }

    Err(Error::InvalidDetections(
        "no detections JSON found in output".to_string(),
    ))
}

fn looks_like_detections(value: &Value) -> bool {
    match value {
        Value::Array(entries) => entries.iter().all(Value::is_object),
        Value::Object(map) => map.contains_key("detections"),
        _ => false,
    }
}

/// Run an external detector and parse its stdout
pub fn run_detector(command: &str, image_path: &Path) -> Result<Vec<Detection>> {
    let mut parts = match shell_words::split(command) {
        Ok(parts) if !parts.is_empty() => parts,
        _ => {
            return Err(Error::Detector(format!(
                "invalid detector command: {:?}",
                command
            )))
        }
    };
    let program = parts.remove(0);

    debug!("Running: {} {:?} --image {:?}", program, parts, image_path);

    let output = Command::new(&program)
        .args(&parts)
        .arg("--image")
        .arg(image_path)
        .output()
        .map_err(|e| Error::Detector(format!("failed to run {}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Detector(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    parse_detections(&String::from_utf8_lossy(&output.stdout))
}

/// Drop detections below `min_confidence`
pub fn filter_by_confidence(detections: Vec<Detection>, min_confidence: f64) -> Vec<Detection> {
    let before = detections.len();
    let kept: Vec<Detection> = detections
        .into_iter()
        .filter(|d| d.confidence >= min_confidence)
        .collect();
    if kept.len() < before {
        debug!(
            dropped = before - kept.len(),
            min_confidence, "filtered low-confidence detections"
        );
    }
    kept
}

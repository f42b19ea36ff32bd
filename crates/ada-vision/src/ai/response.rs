//! JSON extraction from free-text model responses

use ada_types::{clamp_unit, Measurements, Severity, ViolationRecord, MODEL_METHOD};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq)]
pub enum ExtractError {
    #[error("response is empty")]
    Empty,

    #[error("no JSON object found in response")]
    NotFound,

    #[error("invalid JSON: {0}")]
    Invalid(String),
}

/// Find the JSON object embedded in a response.
///
/// Tried in order: the whole text, the first fenced code block, then the
/// span from the first `{` to the last `}`.
pub fn extract_json_payload(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(Value::Array(_)) => return Err(not_an_object("response")),
        _ => {}
    }

    let mut last_error = None;

    if let Some(block) = fenced_block(text) {
        match serde_json::from_str(block) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => return Err(not_an_object("fenced block")),
            Err(e) => last_error = Some(ExtractError::Invalid(e.to_string())),
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            match serde_json::from_str(&text[start..=end]) {
                Ok(Value::Object(map)) => return Ok(map),
                Ok(_) => {}
                Err(e) => last_error = Some(ExtractError::Invalid(e.to_string())),
            }
        }
    }

    Err(last_error.unwrap_or(ExtractError::NotFound))
}

fn not_an_object(what: &str) -> ExtractError {
    ExtractError::Invalid(format!("{} is JSON but not an object", what))
}

/// Contents of the first ``` block, skipping an optional language tag
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = match after.find('\n') {
        Some(newline) if after[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => newline + 1,
        _ => 0,
    };
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Normalized model response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelResponse {
    pub violations: Vec<ViolationRecord>,
    pub overall_assessment: String,
    pub notes: String,
}

/// Convert an extracted payload, defaulting missing fields.
///
/// Entries that are not JSON objects are dropped.
pub fn parse_model_response(payload: &Map<String, Value>) -> ModelResponse {
    let violations = match payload.get("violations") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let record = to_violation_record(entry);
                if record.is_none() {
                    warn!(index = i, "dropping malformed violation entry");
                }
                record
            })
            .collect(),
        Some(other) if !other.is_null() => {
            warn!("\"violations\" is not an array");
            Vec::new()
        }
        _ => Vec::new(),
    };

    ModelResponse {
        violations,
        overall_assessment: text_field(payload, "overall_assessment"),
        notes: text_field(payload, "notes"),
    }
}

/// Legacy degrade-to-empty shape: extraction failure becomes an empty
/// violation list with a diagnostic note
pub fn extract_model_response(text: &str) -> ModelResponse {
    match extract_json_payload(text) {
        Ok(payload) => parse_model_response(&payload),
        Err(e) => {
            let excerpt: String = text.trim().chars().take(200).collect();
            ModelResponse {
                violations: Vec::new(),
                overall_assessment: "Parse error".to_string(),
                notes: if excerpt.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", e, excerpt)
                },
            }
        }
    }
}

/// Build a record from one response entry
pub fn to_violation_record(entry: &Value) -> Option<ViolationRecord> {
    let fields = entry.as_object()?;

    let violation_type = non_empty(text_field(fields, "type")).unwrap_or_else(|| "Unknown".to_string());
    let severity = fields
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse_lenient)
        .unwrap_or(Severity::Minor);
    let ada_code = non_empty(text_field(fields, "ada_code")).unwrap_or_else(|| "N/A".to_string());
    let confidence = match fields.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .map(clamp_unit)
    .unwrap_or(0.5);

    let mut record = ViolationRecord::new(violation_type, severity, ada_code)
        .with_description(text_field(fields, "description"))
        .with_recommendation(text_field(fields, "recommendation"))
        .with_confidence(confidence)
        .with_method(MODEL_METHOD);
    record.measurements = numeric_measurements(fields.get("measurements"));
    Some(record)
}

fn numeric_measurements(value: Option<&Value>) -> Measurements {
    value
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_f64().filter(|f| f.is_finite()).map(|f| (k.clone(), f)))
                .collect()
        })
        .unwrap_or_default()
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

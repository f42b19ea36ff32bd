//! Model backends: canned mock, external CLI command, and the HTTP Messages API

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::prompts::PromptKind;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One request to an external model
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    /// Detector label of the object being analyzed
    pub label: &'a str,
    pub prompt: &'a str,
    /// JPEG-encoded crop of the detection
    pub image_jpeg: &'a [u8],
}

/// Text-completion seam for the model-backed analyzer
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send the prompt and image, returning the raw response text
    fn complete(&self, request: &ModelRequest<'_>) -> Result<String, BackendError>;
}

// ============================================================================
// Mock
// ============================================================================

/// Canned per-category responses for demos and tests
#[derive(Debug, Default, Clone, Copy)]
pub struct MockBackend;

impl ModelBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn complete(&self, request: &ModelRequest<'_>) -> Result<String, BackendError> {
        let response = match PromptKind::for_label(request.label) {
            PromptKind::Doorway => serde_json::json!({
                "violations": [{
                    "type": "Door Width",
                    "severity": "Critical",
                    "ada_code": "404.2.3",
                    "description": "Door opening appears narrower than required 32-inch clear width",
                    "recommendation": "Widen door opening or replace with wider door unit",
                    "confidence": 0.7
                }],
                "overall_assessment": "Potential door width violation",
                "notes": "Mock analysis - requires verification"
            }),
            PromptKind::Parking => serde_json::json!({
                "violations": [{
                    "type": "Signage",
                    "severity": "Critical",
                    "ada_code": "502.6",
                    "description": "Missing or inadequate accessible parking signage",
                    "recommendation": "Install International Symbol of Accessibility sign at 60 inches minimum height",
                    "confidence": 0.8
                }],
                "overall_assessment": "Missing parking signage",
                "notes": "Mock analysis"
            }),
            PromptKind::Pathway => serde_json::json!({
                "violations": [{
                    "type": "Obstruction",
                    "severity": "Moderate",
                    "ada_code": "403.5.1",
                    "description": "Object may obstruct required 36-inch clear pathway width",
                    "recommendation": "Relocate object to maintain minimum clear pathway",
                    "confidence": 0.6
                }],
                "overall_assessment": "Potential pathway obstruction",
                "notes": "Mock analysis"
            }),
            _ => serde_json::json!({
                "violations": [],
                "overall_assessment": "No obvious violations in this view",
                "notes": "Mock analysis"
            }),
        };
        Ok(format!("```json\n{}\n```", serde_json::to_string_pretty(&response).unwrap_or_default()))
    }
}

// ============================================================================
// External command
// ============================================================================

static CROP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Runs an external model CLI.
///
/// The prompt is written to stdin and the crop is passed as
/// `--image <path>` (plus `--model <name>` when set); stdout is the response.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: String,
    model: Option<String>,
}

impl CommandBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    fn crop_path() -> PathBuf {
        let n = CROP_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("ada_crop_{}_{}.jpg", std::process::id(), n))
    }
}

impl ModelBackend for CommandBackend {
    fn name(&self) -> &'static str {
        "command"
    }

    fn complete(&self, request: &ModelRequest<'_>) -> Result<String, BackendError> {
        let mut parts = match shell_words::split(&self.command) {
            Ok(parts) if !parts.is_empty() => parts,
            _ => {
                return Err(BackendError::NotConfigured(format!(
                    "invalid model command: {:?}",
                    self.command
                )))
            }
        };

        let crop_path = Self::crop_path();
        std::fs::write(&crop_path, request.image_jpeg)?;

        let program = parts.remove(0);
        let mut cmd = Command::new(&program);
        cmd.args(&parts);
        cmd.arg("--image");
        cmd.arg(&crop_path);
        if let Some(ref model) = self.model {
            cmd.arg("--model");
            cmd.arg(model);
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!("Running: {} {:?} --image {:?}", program, parts, crop_path);

        let result = run_with_stdin(cmd, request.prompt);
        let _ = std::fs::remove_file(&crop_path);
        let output = result?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Command(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Result<std::process::Output, BackendError> {
    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }
    Ok(child.wait_with_output()?)
}

// ============================================================================
// HTTP Messages API
// ============================================================================

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Calls the Messages API with the crop as a base64 JPEG
pub struct AnthropicBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Read the API key from the named environment variable
    pub fn from_env(var: &str, model: Option<String>) -> Result<Self, BackendError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim(), model),
            _ => Err(BackendError::NotConfigured(format!("{} is not set", var))),
        }
    }
}

impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn complete(&self, request: &ModelRequest<'_>) -> Result<String, BackendError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: "image/jpeg",
                            data: STANDARD.encode(request.image_jpeg),
                        },
                    },
                    ContentBlock::Text { text: request.prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            let truncated: String = text.chars().take(200).collect();
            return Err(BackendError::Http(format!("{}: {}", status, truncated)));
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| BackendError::InvalidResponse("no text content".to_string()))
    }
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(label: &'a str) -> ModelRequest<'a> {
        ModelRequest {
            label,
            prompt: "prompt",
            image_jpeg: &[],
        }
    }

    #[test]
    fn test_mock_responses_by_category() {
        let door = MockBackend.complete(&request("door")).unwrap();
        assert!(door.starts_with("```json"));
        assert!(door.contains("404.2.3"));

        let parking = MockBackend.complete(&request("car")).unwrap();
        assert!(parking.contains("502.6"));

        let other = MockBackend.complete(&request("umbrella")).unwrap();
        assert!(other.contains("\"violations\": []"));
    }

    #[test]
    fn test_invalid_command_is_not_configured() {
        let backend = CommandBackend::new("   ");
        assert!(matches!(
            backend.complete(&request("door")),
            Err(BackendError::NotConfigured(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_prompt_and_crop() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("model.sh");
        std::fs::write(
            &script,
            "cat\necho\necho \"args: $@\"\nif [ -f \"$2\" ]; then echo \"crop present\"; fi\n",
        )
        .unwrap();

        let backend = CommandBackend::new(format!("sh {}", script.display())).with_model(Some("vision-small".into()));
        let request = ModelRequest {
            label: "door",
            prompt: "describe the doorway",
            image_jpeg: &[0xff, 0xd8, 0xff, 0xd9],
        };
        let output = backend.complete(&request).unwrap();

        assert!(output.starts_with("describe the doorway"));
        assert!(output.contains("--model vision-small"));
        assert!(output.contains("crop present"));

        let args: Vec<&str> = output
            .lines()
            .find_map(|line| line.strip_prefix("args: "))
            .unwrap()
            .split_whitespace()
            .collect();
        assert_eq!(args[0], "--image");
        let crop = PathBuf::from(args[1]);
        assert!(crop.extension().is_some_and(|ext| ext == "jpg"));
        assert!(!crop.exists(), "crop should be removed after the call");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_reports_stderr() {
        let backend = CommandBackend::new("sh -c 'echo model offline >&2; exit 3'");
        let err = backend.complete(&request("door")).unwrap_err();
        assert!(matches!(err, BackendError::Command(_)));
        assert!(err.to_string().contains("model offline"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = AnthropicBackend::from_env("ADA_CHECKER_TEST_UNSET_KEY", None).unwrap_err();
        assert!(err.to_string().contains("ADA_CHECKER_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: "image/jpeg",
                            data: STANDARD.encode([1u8, 2, 3]),
                        },
                    },
                    ContentBlock::Text { text: "hi" },
                ],
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["data"], "AQID");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "hi");
    }
}

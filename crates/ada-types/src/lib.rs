//! Core types for accessibility auditing

mod error;
mod result;
mod types;

pub use error::*;
pub use result::*;
pub use types::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Which analyzer family produces the violations for an image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    #[default]
    #[value(name = "rule_based")]
    RuleBased,
    Model,
}

impl AnalyzerKind {
    /// Name recorded in result metadata
    pub fn name(&self) -> &'static str {
        match self {
            AnalyzerKind::RuleBased => RULE_BASED_METHOD,
            AnalyzerKind::Model => MODEL_METHOD,
        }
    }
}

impl std::fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzerKind::RuleBased => write!(f, "rule_based"),
            AnalyzerKind::Model => write!(f, "model"),
        }
    }
}

/// External model used by the model-backed analyzer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackendKind {
    /// Canned responses, no external calls
    #[default]
    Mock,
    /// External CLI tool
    Command,
    /// HTTP Messages API
    Anthropic,
}

impl std::fmt::Display for ModelBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelBackendKind::Mock => write!(f, "mock"),
            ModelBackendKind::Command => write!(f, "command"),
            ModelBackendKind::Anthropic => write!(f, "anthropic"),
        }
    }
}

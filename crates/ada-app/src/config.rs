//! Configuration management for ada-checker
//!
//! Config stored at: ~/.config/ada-checker/config.json

use ada_types::{AnalyzerKind, ConfigError, ModelBackendKind, OutputFormat, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ada-checker";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer family (rule_based, model)
    #[serde(default)]
    pub analyzer: AnalyzerKind,

    /// Backend for the model analyzer (mock, command, anthropic)
    #[serde(default)]
    pub model_backend: ModelBackendKind,

    /// Model name override (optional)
    #[serde(default)]
    pub model: Option<String>,

    /// Command line for the command backend
    #[serde(default)]
    pub model_command: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// External object detector, invoked with `--image <path>`
    #[serde(default)]
    pub detector_command: Option<String>,

    /// Detections below this confidence are skipped
    #[serde(default = "default_min_confidence")]
    pub min_detection_confidence: f64,

    /// Enable model response caching
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache directory override
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerKind::default(),
            model_backend: ModelBackendKind::default(),
            model: None,
            model_command: None,
            api_key_env: default_api_key_env(),
            detector_command: None,
            min_detection_confidence: default_min_confidence(),
            cache_enabled: true,
            cache_dir: None,
            output_format: default_output_format(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }

        let cache_dir = dirs::cache_dir()
            .ok_or(ConfigError::NotFound)?
            .join(APP_DIR);
        Ok(cache_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(ConfigError::InvalidValue(format!(
                "min_detection_confidence must be within [0, 1], got {}",
                self.min_detection_confidence
            ))
            .into());
        }

        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::InvalidValue("api_key_env must not be empty".to_string()).into());
        }

        for (name, command) in [
            ("model_command", &self.model_command),
            ("detector_command", &self.detector_command),
        ] {
            if let Some(command) = command {
                match shell_words::split(command) {
                    Ok(parts) if !parts.is_empty() => {}
                    _ => {
                        return Err(ConfigError::InvalidValue(format!(
                            "{} is not a valid command line: {:?}",
                            name, command
                        ))
                        .into())
                    }
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ADA Checker Configuration")?;
        writeln!(f, "=========================")?;
        writeln!(f)?;
        writeln!(f, "Analyzer:         {}", self.analyzer)?;
        writeln!(f, "Model backend:    {}", self.model_backend)?;
        writeln!(
            f,
            "Model:            {}",
            self.model.as_deref().unwrap_or("(default)")
        )?;
        writeln!(
            f,
            "Model command:    {}",
            self.model_command.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "API key env:      {}", self.api_key_env)?;
        writeln!(
            f,
            "Detector command: {}",
            self.detector_command.as_deref().unwrap_or("(none)")
        )?;
        writeln!(f, "Min confidence:   {:.2}", self.min_detection_confidence)?;
        writeln!(f, "Cache enabled:    {}", self.cache_enabled)?;
        writeln!(
            f,
            "Cache dir:        {}",
            self.cache_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_types::Error;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analyzer, AnalyzerKind::RuleBased);
        assert_eq!(config.min_detection_confidence, 0.5);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            analyzer: AnalyzerKind::Model,
            model_backend: ModelBackendKind::Command,
            model_command: Some("vision-cli --json".to_string()),
            min_detection_confidence: 0.3,
            output_format: OutputFormat::Json,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"analyzer\": \"model\""));
        assert!(content.contains("\"model_backend\": \"command\""));
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"analyzer": "model"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analyzer, AnalyzerKind::Model);
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            min_detection_confidence: 1.5,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue(_)))
        ));

        let config = Config {
            detector_command: Some("detect 'unterminated".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_cache_dir_override() {
        let config = Config {
            cache_dir: Some(PathBuf::from("/tmp/ada-cache")),
            ..Config::default()
        };
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/ada-cache"));
    }
}

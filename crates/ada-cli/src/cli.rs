//! CLI definition using clap

use ada_types::{AnalyzerKind, ModelBackendKind, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ada-checker")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "ADA accessibility compliance auditing from detected objects in images")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model backend for the model analyzer. Uses config value if not specified.
    #[arg(long, global = true)]
    pub backend: Option<ModelBackendKind>,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a single image
    Analyze {
        /// Path to image file
        image: PathBuf,

        /// Detections JSON file. Defaults to <image>.detections.json or the configured detector.
        #[arg(long, short = 'd')]
        detections: Option<PathBuf>,

        /// Analyzer to use. Uses config value if not specified.
        #[arg(long, short = 'a')]
        analyzer: Option<AnalyzerKind>,

        /// Skip detections below this confidence. Uses config value if not specified.
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Skip the model response cache (overrides config)
        #[arg(long)]
        no_cache: bool,

        /// Print the full text audit report
        #[arg(long, short = 'r')]
        report: bool,

        /// Write a copy of the image with severity-colored boxes to this path
        #[arg(long)]
        annotate: Option<PathBuf>,
    },

    /// Audit every image in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Output file for results
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Analyzer to use. Uses config value if not specified.
        #[arg(long, short = 'a')]
        analyzer: Option<AnalyzerKind>,

        /// Skip the model response cache (overrides config)
        #[arg(long)]
        no_cache: bool,
    },

    /// List ADA Standards clauses, optionally filtered by keyword
    Codes {
        /// Keyword matched against code, title and requirement
        keyword: Option<String>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default analyzer
        #[arg(long)]
        set_analyzer: Option<AnalyzerKind>,

        /// Set model backend
        #[arg(long)]
        set_backend: Option<ModelBackendKind>,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set the command line for the command backend
        #[arg(long)]
        set_model_command: Option<String>,

        /// Set the environment variable holding the API key
        #[arg(long)]
        set_api_key_env: Option<String>,

        /// Set the external detector command line
        #[arg(long)]
        set_detector: Option<String>,

        /// Set the minimum detection confidence (0.0 - 1.0)
        #[arg(long)]
        set_min_confidence: Option<f64>,

        /// Enable/disable cache
        #[arg(long)]
        set_cache: Option<bool>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },

    /// Manage the model response cache
    Cache {
        /// Clear all cached responses
        #[arg(long)]
        clear: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "ada-checker",
            "analyze",
            "shop.jpg",
            "--analyzer",
            "rule_based",
            "-d",
            "shop.json",
            "--format",
            "json",
            "--report",
            "--annotate",
            "shop.audit.png",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Analyze {
                image,
                detections,
                analyzer,
                report,
                annotate,
                ..
            } => {
                assert_eq!(annotate, Some(PathBuf::from("shop.audit.png")));
                assert_eq!(image, PathBuf::from("shop.jpg"));
                assert_eq!(detections, Some(PathBuf::from("shop.json")));
                assert_eq!(analyzer, Some(AnalyzerKind::RuleBased));
                assert!(report);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_config_setters() {
        let cli = Cli::parse_from([
            "ada-checker",
            "config",
            "--set-backend",
            "anthropic",
            "--set-min-confidence",
            "0.4",
        ]);
        match cli.command {
            Commands::Config {
                set_backend,
                set_min_confidence,
                ..
            } => {
                assert_eq!(set_backend, Some(ModelBackendKind::Anthropic));
                assert_eq!(set_min_confidence, Some(0.4));
            }
            _ => panic!("expected config"),
        }
    }
}

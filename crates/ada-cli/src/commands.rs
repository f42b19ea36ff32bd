//! Command execution

use crate::cli::{Cli, Commands};
use crate::output::{output_batch_summary, output_codes, output_result};
use ada_app::app::{AuditOptions, Auditor};
use ada_app::config::Config;
use ada_app::detector::DetectionSource;
use ada_app::scanner::{load_rgb_image, scan_directory};
use ada_domain::model::{all_codes, search};
use ada_domain::service::SeveritySummary;
use ada_types::{AnalysisResult, AnalyzerKind, ModelBackendKind, OutputFormat};
use ada_types::{CacheError, Error, Result};
use ada_vision::{annotate, with_summary_panel, ResponseCache};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// One image of a batch run
#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SeveritySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Results file written by `batch -o`
#[derive(Debug, Serialize)]
pub struct BatchResults {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub analyzer: String,
    pub totals: SeveritySummary,
    pub entries: Vec<BatchEntry>,
}

pub fn execute(cli: Cli) -> Result<()> {
    // Load config
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(backend) = cli.backend {
        config.model_backend = backend;
    }
    if cli.model.is_some() {
        config.model = cli.model.clone();
    }

    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Analyze {
            image,
            detections,
            analyzer,
            min_confidence,
            no_cache,
            report,
            annotate,
        } => {
            let mut options = AuditOptions::new()
                .with_analyzer(analyzer.unwrap_or(config.analyzer))
                .with_cache(!no_cache && config.cache_enabled);
            if let Some(path) = detections {
                options = options.with_detections(DetectionSource::File(path.clone()));
            }
            if let Some(min_confidence) = min_confidence {
                options = options.with_min_confidence(*min_confidence);
            }
            cmd_analyze(&config, image.clone(), &options, output_format, *report, annotate.as_deref())
        }

        Commands::Batch {
            folder,
            output,
            analyzer,
            no_cache,
        } => {
            let options = AuditOptions::new()
                .with_analyzer(analyzer.unwrap_or(config.analyzer))
                .with_cache(!no_cache && config.cache_enabled);
            cmd_batch(&cli, &config, folder.clone(), output.clone(), &options, output_format)
        }

        Commands::Codes { keyword } => cmd_codes(keyword.as_deref(), output_format),

        Commands::Config {
            show,
            set_analyzer,
            set_backend,
            set_model,
            set_model_command,
            set_api_key_env,
            set_detector,
            set_min_confidence,
            set_cache,
            set_output,
            reset,
        } => cmd_config(ConfigChanges {
            show: *show,
            analyzer: *set_analyzer,
            backend: *set_backend,
            model: set_model.clone(),
            model_command: set_model_command.clone(),
            api_key_env: set_api_key_env.clone(),
            detector: set_detector.clone(),
            min_confidence: *set_min_confidence,
            cache: *set_cache,
            output: *set_output,
            reset: *reset,
        }),

        Commands::Cache { clear } => cmd_cache(&config, *clear),
    }
}

fn cmd_analyze(
    config: &Config,
    image: PathBuf,
    options: &AuditOptions,
    output_format: OutputFormat,
    report: bool,
    annotate_to: Option<&Path>,
) -> Result<()> {
    let auditor = Auditor::new(config, options).map_err(|e| Error::AnalysisFailed(e.to_string()))?;
    let result = auditor
        .audit(&image)
        .map_err(|e| Error::AnalysisFailed(e.to_string()))?;

    if let Some(path) = annotate_to {
        write_annotated(&image, &result, path)?;
    }

    output_result(output_format, &result, report)
}

fn write_annotated(image: &Path, result: &AnalysisResult, path: &Path) -> Result<()> {
    let source = load_rgb_image(image)?;
    with_summary_panel(&annotate(&source, result), result).save(path)?;
    info!("Annotated image written to {}", path.display());
    Ok(())
}

fn cmd_batch(
    cli: &Cli,
    config: &Config,
    folder: PathBuf,
    output: Option<PathBuf>,
    options: &AuditOptions,
    output_format: OutputFormat,
) -> Result<()> {
    // Scan directory
    let images = scan_directory(&folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            folder.display()
        )));
    }

    let auditor = Auditor::new(config, options).map_err(|e| Error::AnalysisFailed(e.to_string()))?;

    let total_images = images.len();
    if cli.verbose {
        eprintln!(
            "Found {} images to audit with {} (cache: {})",
            total_images,
            auditor.analyzer_name(),
            if options.use_cache { "on" } else { "off" }
        );
    }

    let pb = ProgressBar::new(total_images as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .map_err(|e| Error::AnalysisFailed(e.to_string()))?
            .progress_chars("#>-"),
    );

    let started_at = Utc::now();
    let mut totals = SeveritySummary::default();
    let mut entries = Vec::with_capacity(total_images);

    for image in &images {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(name);

        let entry = match auditor.audit(image) {
            Ok(result) => {
                let summary = SeveritySummary::from_result(&result);
                totals.merge(&summary);
                BatchEntry {
                    image: image.display().to_string(),
                    summary: Some(summary),
                    result: Some(result),
                    error: None,
                }
            }
            Err(e) => {
                pb.println(format!("Failed: {}: {}", image.display(), e));
                BatchEntry {
                    image: image.display().to_string(),
                    summary: None,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        entries.push(entry);
        pb.inc(1);
    }
    pb.finish_with_message("done");

    let results = BatchResults {
        started_at,
        completed_at: Utc::now(),
        analyzer: auditor.analyzer_name().to_string(),
        totals,
        entries,
    };

    info!(
        images = total_images,
        violations = results.totals.total,
        "batch complete"
    );

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&results)?;
        std::fs::write(&path, content)?;
        eprintln!("Results saved to: {}", path.display());
    }

    output_batch_summary(output_format, &results)
}

fn cmd_codes(keyword: Option<&str>, output_format: OutputFormat) -> Result<()> {
    let codes: Vec<_> = match keyword {
        Some(keyword) => search(keyword),
        None => all_codes().iter().collect(),
    };
    output_codes(output_format, &codes)
}

/// Requested edits for `config`
struct ConfigChanges {
    show: bool,
    analyzer: Option<AnalyzerKind>,
    backend: Option<ModelBackendKind>,
    model: Option<String>,
    model_command: Option<String>,
    api_key_env: Option<String>,
    detector: Option<String>,
    min_confidence: Option<f64>,
    cache: Option<bool>,
    output: Option<OutputFormat>,
    reset: bool,
}

fn cmd_config(changes: ConfigChanges) -> Result<()> {
    if changes.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(analyzer) = changes.analyzer {
        config.analyzer = analyzer;
        modified = true;
    }

    if let Some(backend) = changes.backend {
        config.model_backend = backend;
        modified = true;
    }

    if let Some(model) = changes.model {
        config.model = Some(model);
        modified = true;
    }

    if let Some(command) = changes.model_command {
        config.model_command = Some(command);
        modified = true;
    }

    if let Some(var) = changes.api_key_env {
        config.api_key_env = var;
        modified = true;
    }

    if let Some(command) = changes.detector {
        config.detector_command = Some(command);
        modified = true;
    }

    if let Some(min_confidence) = changes.min_confidence {
        config.min_detection_confidence = min_confidence;
        modified = true;
    }

    if let Some(cache_enabled) = changes.cache {
        config.cache_enabled = cache_enabled;
        modified = true;
    }

    if let Some(output_format) = changes.output {
        config.output_format = output_format;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if changes.show || !modified {
        println!("{}", config);
    }

    Ok(())
}

fn cmd_cache(config: &Config, clear: bool) -> Result<()> {
    if !config.cache_enabled {
        return Err(Error::Cache(CacheError::IoError(
            "Cache is disabled. Enable with: ada-checker config --set-cache true".to_string(),
        )));
    }

    let cache = ResponseCache::new(config.cache_dir()?.join("responses"))?;

    if clear {
        let count = cache.clear()?;
        println!("Cleared {} cached responses", count);
    } else {
        println!("Cache dir:         {}", cache.cache_dir().display());
        println!("Cached responses:  {}", cache.len()?);
    }

    Ok(())
}

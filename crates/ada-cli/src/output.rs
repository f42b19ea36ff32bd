//! Output formatting module

use crate::commands::BatchResults;
use ada_domain::model::AdaCode;
use ada_domain::service::{generate_audit_report, SeveritySummary};
use ada_types::{AnalysisResult, DetectionStatus, OutputFormat, Result};

pub fn output_result(output_format: OutputFormat, result: &AnalysisResult, report: bool) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(result)?;
        println!("{}", content);
        return Ok(());
    }

    if report {
        print!("{}", generate_audit_report(result));
        return Ok(());
    }

    // Table format
    println!("\nAudit Result");
    println!("============");
    if let Some(ref image) = result.image {
        println!("Image:           {}", image);
    }
    println!("Analyzer:        {}", result.analyzer_type);
    println!("Objects:         {}", result.detections.len());

    for entry in &result.detections {
        let status = match entry.status {
            DetectionStatus::Analyzed => format!("{} violation(s)", entry.violations.len()),
            DetectionStatus::Failed { .. } => "analysis failed".to_string(),
        };
        println!(
            "\n{:<13} {:<16} conf {:>3.0}%  {}",
            entry.key,
            entry.object,
            entry.detector_confidence * 100.0,
            status
        );
        for violation in entry.violations_by_severity() {
            println!(
                "  {:<9} {:<22} ADA {:<8} {:>3.0}%",
                violation.severity.label(),
                violation.violation_type,
                violation.ada_code,
                violation.confidence * 100.0
            );
        }
        if let DetectionStatus::Failed { ref reason } = entry.status {
            println!("  {}", reason);
        }
    }

    print_summary(&SeveritySummary::from_result(result));
    Ok(())
}

fn print_summary(summary: &SeveritySummary) {
    println!("\n--- Summary ---");
    println!("Critical:        {}", summary.critical);
    println!("Moderate:        {}", summary.moderate);
    println!("Minor:           {}", summary.minor);
    println!("Total:           {}", summary.total);
    if summary.failed > 0 {
        println!("Failed objects:  {}", summary.failed);
    }
}

pub fn output_batch_summary(output_format: OutputFormat, results: &BatchResults) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(results)?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nBatch Audit");
    println!("===========");
    println!("Analyzer:        {}", results.analyzer);
    println!(
        "Duration:        {:.1}s",
        (results.completed_at - results.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();
    println!("{:<40} {:>8} {:>8} {:>8} {:>8}", "Image", "Critical", "Moderate", "Minor", "Objects");
    println!("{}", "-".repeat(76));
    for entry in &results.entries {
        let name = std::path::Path::new(&entry.image)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.image.clone());
        match (&entry.summary, &entry.error) {
            (Some(s), _) => println!(
                "{:<40} {:>8} {:>8} {:>8} {:>8}",
                truncate(&name, 40),
                s.critical,
                s.moderate,
                s.minor,
                s.objects
            ),
            (None, Some(error)) => println!("{:<40} error: {}", truncate(&name, 40), error),
            (None, None) => {}
        }
    }

    print_summary(&results.totals);
    Ok(())
}

pub fn output_codes(output_format: OutputFormat, codes: &[&AdaCode]) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(codes)?;
        println!("{}", content);
        return Ok(());
    }

    if codes.is_empty() {
        println!("No matching ADA codes");
        return Ok(());
    }

    for code in codes {
        println!("{:<8} {}", code.code, code.title);
        println!("         {}", code.requirement);
        println!("         Measurement: {}", code.measurement);
        println!("         {}", code.url());
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_len.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

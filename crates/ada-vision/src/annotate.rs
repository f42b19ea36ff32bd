//! Draw audit results back onto the source image

use ada_types::{AnalysisResult, DetectionReport, Severity};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

pub const CRITICAL_COLOR: Rgb<u8> = Rgb([220, 30, 30]);
pub const MODERATE_COLOR: Rgb<u8> = Rgb([255, 150, 0]);
pub const MINOR_COLOR: Rgb<u8> = Rgb([250, 220, 0]);
pub const COMPLIANT_COLOR: Rgb<u8> = Rgb([34, 170, 60]);
pub const FAILED_COLOR: Rgb<u8> = Rgb([140, 140, 140]);

const BOX_THICKNESS: u32 = 3;
const PANEL_HEIGHT: u32 = 16;
const PANEL_BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);

pub fn severity_color(severity: Severity) -> Rgb<u8> {
    match severity {
        Severity::Critical => CRITICAL_COLOR,
        Severity::Moderate => MODERATE_COLOR,
        Severity::Minor => MINOR_COLOR,
    }
}

/// Box color for a detection: its worst severity, green when clean,
/// gray when the analysis failed
pub fn report_color(report: &DetectionReport) -> Rgb<u8> {
    if report.status.is_failed() {
        return FAILED_COLOR;
    }
    report
        .violations
        .iter()
        .map(|v| v.severity)
        .min_by_key(Severity::rank)
        .map(severity_color)
        .unwrap_or(COMPLIANT_COLOR)
}

/// Copy of `image` with every detection outlined in its severity color.
///
/// Boxes are clipped to the frame; boxes entirely outside it are skipped.
pub fn annotate(image: &RgbImage, result: &AnalysisResult) -> RgbImage {
    let mut annotated = image.clone();
    let (frame_width, frame_height) = annotated.dimensions();

    for report in &result.detections {
        let Some((x, y, width, height)) = report.bbox.clamp_to(frame_width, frame_height) else {
            continue;
        };
        let color = report_color(report);

        // nested outlines grow the border inward
        for inset in 0..BOX_THICKNESS {
            if width <= inset * 2 || height <= inset * 2 {
                break;
            }
            let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(width - inset * 2, height - inset * 2);
            draw_hollow_rect_mut(&mut annotated, rect, color);
        }
    }

    annotated
}

/// Prepend a strip whose colored segments are proportional to the
/// violation counts per severity; a clean audit gets a green strip.
pub fn with_summary_panel(image: &RgbImage, result: &AnalysisResult) -> RgbImage {
    let width = image.width();
    let mut panel = RgbImage::from_pixel(width, image.height() + PANEL_HEIGHT, PANEL_BACKGROUND);
    imageops::replace(&mut panel, image, 0, PANEL_HEIGHT as i64);

    if width == 0 {
        return panel;
    }

    let total = result.total_violations();
    if total == 0 {
        draw_filled_rect_mut(&mut panel, Rect::at(0, 2).of_size(width, PANEL_HEIGHT - 4), COMPLIANT_COLOR);
        return panel;
    }

    let mut x = 0u32;
    for severity in Severity::ALL {
        let count = result.count_severity(severity);
        if count == 0 {
            continue;
        }
        let segment = ((count as u64 * width as u64) / total as u64).max(1) as u32;
        let segment = segment.min(width.saturating_sub(x));
        if segment == 0 {
            break;
        }
        draw_filled_rect_mut(
            &mut panel,
            Rect::at(x as i32, 2).of_size(segment, PANEL_HEIGHT - 4),
            severity_color(severity),
        );
        x += segment;
    }

    panel
}

//! Edge maps, line segments and contour shapes

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// Binary edge map (255 = edge)
pub fn canny_edges(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    canny(gray, low, high)
}

/// A finite run of edge pixels along a Hough line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: (f64, f64),
    pub end: (f64, f64),
    /// Least-squares orientation of the supporting pixels, 0 = horizontal, 90 = vertical
    pub angle_degrees: f64,
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn mid_x(&self) -> f64 {
        (self.start.0 + self.end.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentOptions {
    /// Minimum accumulator votes for a candidate line
    pub vote_threshold: u32,
    pub suppression_radius: u32,
    pub min_length: f64,
    /// Largest run of missing pixels bridged inside one segment
    pub max_gap: u32,
}

/// Distance (pixels) searched around the ideal line for a supporting edge pixel
const SNAP_RADIUS: i64 = 2;

/// Find line segments in an edge map.
///
/// Candidate lines come from the Hough accumulator; each is then walked
/// across the image to split it into runs of supporting edge pixels.
pub fn detect_segments(edges: &GrayImage, options: &SegmentOptions) -> Vec<LineSegment> {
    if edges.width() == 0 || edges.height() == 0 {
        return Vec::new();
    }

    let lines = detect_lines(
        edges,
        LineDetectionOptions {
            vote_threshold: options.vote_threshold,
            suppression_radius: options.suppression_radius,
        },
    );

    lines
        .iter()
        .flat_map(|line| walk_line(edges, line, options))
        .collect()
}

fn walk_line(edges: &GrayImage, line: &PolarLine, options: &SegmentOptions) -> Vec<LineSegment> {
    let (width, height) = (edges.width() as i64, edges.height() as i64);
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (sin, cos) = theta.sin_cos();
    let r = line.r as f64;

    // x*cos + y*sin = r; walk along the direction perpendicular to the normal
    let base = (r * cos, r * sin);
    let dir = (-sin, cos);
    let reach = (width + height) as i64;

    let mut segments = Vec::new();
    let mut run: Vec<(f64, f64)> = Vec::new();
    let mut gap = 0u32;

    for t in -reach..=reach {
        let px = base.0 + t as f64 * dir.0;
        let py = base.1 + t as f64 * dir.1;
        let (ix, iy) = (px.round() as i64, py.round() as i64);
        let inside = ix >= 0 && iy >= 0 && ix < width && iy < height;

        match inside.then(|| nearest_edge(edges, px, py)).flatten() {
            Some(hit) => {
                if run.last() != Some(&hit) {
                    run.push(hit);
                }
                gap = 0;
            }
            None => {
                if !run.is_empty() {
                    gap += 1;
                    if gap > options.max_gap || !inside {
                        finish_run(&mut run, options.min_length, &mut segments);
                        gap = 0;
                    }
                }
            }
        }
    }
    finish_run(&mut run, options.min_length, &mut segments);
    segments
}

fn nearest_edge(edges: &GrayImage, px: f64, py: f64) -> Option<(f64, f64)> {
    let (cx, cy) = (px.round() as i64, py.round() as i64);
    let mut best: Option<((f64, f64), f64)> = None;
    for dy in -SNAP_RADIUS..=SNAP_RADIUS {
        for dx in -SNAP_RADIUS..=SNAP_RADIUS {
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= edges.width() as i64 || y >= edges.height() as i64 {
                continue;
            }
            if edges.get_pixel(x as u32, y as u32)[0] == 0 {
                continue;
            }
            let d = (x as f64 - px).powi(2) + (y as f64 - py).powi(2);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some(((x as f64, y as f64), d));
            }
        }
    }
    best.map(|(p, _)| p)
}

fn finish_run(run: &mut Vec<(f64, f64)>, min_length: f64, out: &mut Vec<LineSegment>) {
    if run.len() >= 2 {
        let start = run[0];
        let end = run[run.len() - 1];
        let segment = LineSegment {
            start,
            end,
            angle_degrees: fitted_angle(run),
        };
        if segment.length() >= min_length {
            out.push(segment);
        }
    }
    run.clear();
}

/// Principal-axis orientation of a point set, folded into [0, 90]
fn fitted_angle(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let (mx, my) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mx, my) = (mx / n, my / n);

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let (dx, dy) = (x - mx, y - my);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let orientation = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let degrees = orientation.to_degrees().abs();
    if degrees > 90.0 {
        180.0 - degrees
    } else {
        degrees
    }
}

/// Outer contour of a connected edge component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourShape {
    /// Polygon area enclosed by the traced border
    pub area: f64,
    pub bounds_width: u32,
    pub bounds_height: u32,
}

impl ContourShape {
    /// Long side over short side of the bounding rectangle; 0 when degenerate
    pub fn elongation(&self) -> f64 {
        let long = self.bounds_width.max(self.bounds_height) as f64;
        let short = self.bounds_width.min(self.bounds_height) as f64;
        if short > 0.0 {
            long / short
        } else {
            0.0
        }
    }
}

/// Outermost contours of an edge map
pub fn compact_contours(edges: &GrayImage) -> Vec<ContourShape> {
    if edges.width() == 0 || edges.height() == 0 {
        return Vec::new();
    }

    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let xs = c.points.iter().map(|p| p.x);
            let ys = c.points.iter().map(|p| p.y);
            let (min_x, max_x) = xs.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
            let (min_y, max_y) = ys.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));

            let mut twice_area = 0i64;
            for (i, p) in c.points.iter().enumerate() {
                let q = &c.points[(i + 1) % c.points.len()];
                twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
            }

            ContourShape {
                area: twice_area.abs() as f64 / 2.0,
                bounds_width: (max_x - min_x + 1) as u32,
                bounds_height: (max_y - min_y + 1) as u32,
            }
        })
        .collect()
}

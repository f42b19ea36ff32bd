//! Pixel-statistics primitives shared by the category analyzers

pub mod color;
pub mod edges;
pub mod region;

pub use color::{lab_lightness, rgb_to_hsv, Hsv, HsvRange};
pub use edges::{canny_edges, compact_contours, detect_segments, ContourShape, LineSegment, SegmentOptions};
pub use region::{crop_region, is_empty_region, to_gray};

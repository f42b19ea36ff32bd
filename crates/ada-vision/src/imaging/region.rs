//! Region extraction

use ada_types::BoundingBox;
use image::{imageops, GrayImage, RgbImage};

/// Crop the part of `image` covered by `bbox`.
///
/// Boxes are clamped to the frame; a box with no visible area yields a
/// 0x0 image.
pub fn crop_region(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    match bbox.clamp_to(image.width(), image.height()) {
        Some((x, y, w, h)) => imageops::crop_imm(image, x, y, w, h).to_image(),
        None => RgbImage::new(0, 0),
    }
}

pub fn is_empty_region(region: &RgbImage) -> bool {
    region.width() == 0 || region.height() == 0
}

pub fn to_gray(region: &RgbImage) -> GrayImage {
    imageops::grayscale(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_clamps_to_frame() {
        let mut image = RgbImage::from_pixel(100, 50, Rgb([10, 10, 10]));
        image.put_pixel(99, 49, Rgb([200, 0, 0]));
        let region = crop_region(&image, &BoundingBox::new(90, 40, 30, 30));
        assert_eq!(region.dimensions(), (10, 10));
        assert_eq!(region.get_pixel(9, 9), &Rgb([200, 0, 0]));
    }

    #[test]
    fn test_crop_outside_is_empty() {
        let image = RgbImage::new(20, 20);
        let region = crop_region(&image, &BoundingBox::new(50, 50, 10, 10));
        assert!(is_empty_region(&region));
        let zero = crop_region(&image, &BoundingBox::new(0, 0, 0, 10));
        assert!(is_empty_region(&zero));
    }
}

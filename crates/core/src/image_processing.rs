//! Image encoding and view placement.
//!
//! Recognition runs on the full-resolution image, while the overlay shows
//! the image contain-fitted into the window. [`ImageProcessor::fit`]
//! computes where the image lands and the pixel density that converts
//! recognizer coordinates into overlay coordinates.

use crate::error::{AppError, Result};
use crate::geometry::{Point, Rect};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Where an image is drawn inside a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left of the drawn image in view coordinates.
    pub origin: Point,
    /// Drawn size in view coordinates.
    pub size: (f32, f32),
    /// Image pixels per view unit.
    pub pixel_density: f32,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.origin.x, self.origin.y, self.size.0, self.size.1)
    }
}

/// Image processing utilities for the recognition workflow.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Encodes an image as a Base64 PNG string for the Vision request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the image is empty or
    /// encoding fails.
    pub fn encode_to_base64_png(image: &DynamicImage) -> Result<String> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AppError::image("Image has no pixels"));
        }

        let mut buffer: Vec<u8> = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(BASE64.encode(buffer))
    }

    /// Contain-fits an `image_size` image into `view_size`, centred.
    ///
    /// A degenerate view or image yields an unscaled placement at the origin.
    pub fn fit(image_size: (u32, u32), view_size: (f32, f32)) -> Placement {
        let (image_w, image_h) = (image_size.0 as f32, image_size.1 as f32);
        let (view_w, view_h) = view_size;

        if image_w <= 0.0 || image_h <= 0.0 || view_w <= 0.0 || view_h <= 0.0 {
            return Placement {
                origin: Point::default(),
                size: (image_w, image_h),
                pixel_density: 1.0,
            };
        }

        let density = (image_w / view_w).max(image_h / view_h);
        let size = (image_w / density, image_h / density);
        Placement {
            origin: Point::new((view_w - size.0) / 2.0, (view_h - size.1) / 2.0),
            size,
            pixel_density: density,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn wide_image_is_letterboxed() {
        let placement = ImageProcessor::fit((2000, 1000), (1000.0, 800.0));
        assert_eq!(placement.pixel_density, 2.0);
        assert_eq!(placement.size, (1000.0, 500.0));
        assert_eq!(placement.origin, Point::new(0.0, 150.0));
    }

    #[test]
    fn tall_image_is_pillarboxed() {
        let placement = ImageProcessor::fit((500, 1000), (1000.0, 500.0));
        assert_eq!(placement.pixel_density, 2.0);
        assert_eq!(placement.size, (250.0, 500.0));
        assert_eq!(placement.origin, Point::new(375.0, 0.0));
    }

    #[test]
    fn small_image_is_upscaled() {
        let placement = ImageProcessor::fit((100, 100), (400.0, 200.0));
        assert_eq!(placement.pixel_density, 0.5);
        assert_eq!(placement.rect(), Rect::new(100.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn degenerate_view_is_unscaled() {
        let placement = ImageProcessor::fit((100, 50), (0.0, 0.0));
        assert_eq!(placement.pixel_density, 1.0);
        assert_eq!(placement.origin, Point::default());
    }

    #[test]
    fn encodes_png_base64() {
        let image = DynamicImage::new_rgba8(4, 4);
        let encoded = ImageProcessor::encode_to_base64_png(&image).unwrap();
        let bytes = BASE64.decode(encoded).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn refuses_empty_image() {
        let image = DynamicImage::new_rgba8(0, 0);
        assert!(matches!(
            ImageProcessor::encode_to_base64_png(&image),
            Err(AppError::ImageProcessing(_))
        ));
    }
}

//! Image utilities for testing.
//!
//! Decoding raster responses and checking their pixels.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, Rgba};

/// Load an image from a byte array
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Detect image format from bytes
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Check if an image has the expected dimensions
pub fn assert_image_dimensions(
    image: &DynamicImage,
    expected_width: u32,
    expected_height: u32,
) -> Result<(), String> {
    let (actual_width, actual_height) = image.dimensions();

    if actual_width != expected_width || actual_height != expected_height {
        return Err(format!(
            "Image dimensions differ: actual = {}x{}, expected = {}x{}",
            actual_width, actual_height, expected_width, expected_height
        ));
    }

    Ok(())
}

/// Check if an image has the expected format
pub fn assert_image_format(bytes: &[u8], expected_format: ImageFormat) -> Result<(), String> {
    let actual_format =
        detect_image_format(bytes).ok_or_else(|| "Could not detect image format".to_string())?;

    if actual_format != expected_format {
        return Err(format!(
            "Image format differs: actual = {:?}, expected = {:?}",
            actual_format, expected_format
        ));
    }

    Ok(())
}

/// Number of fully transparent pixels
pub fn count_transparent(image: &DynamicImage) -> usize {
    image.pixels().filter(|(_, _, pixel)| pixel.0[3] == 0).count()
}

/// Distinct opaque colours in an image
pub fn distinct_opaque_colours(image: &DynamicImage) -> Vec<Rgba<u8>> {
    let mut colours: Vec<Rgba<u8>> = Vec::new();
    for (_, _, pixel) in image.pixels() {
        if pixel.0[3] > 0 && !colours.contains(&pixel) {
            colours.push(pixel);
        }
    }
    colours
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    #[test]
    fn test_transparency_helpers() {
        let mut img = ImageBuffer::<Rgba<u8>, Vec<u8>>::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        let img = DynamicImage::ImageRgba8(img);

        assert_eq!(count_transparent(&img), 2);
        assert_eq!(distinct_opaque_colours(&img), vec![Rgba([255, 0, 0, 255])]);
        assert!(assert_image_dimensions(&img, 2, 2).is_ok());
    }
}

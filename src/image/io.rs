//! Convenience helpers bridging the `image` crate.

use crate::image::ImageView;
use crate::util::{ContourMatchError, ContourMatchResult};
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &GrayImage) -> ContourMatchResult<ImageView<'_, u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageView::from_slice(img.as_raw(), width, height)
}

/// Converts any decoded image to 8-bit grayscale.
pub fn gray_from_dynamic_image(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> ContourMatchResult<GrayImage> {
    let img = image::open(path).map_err(|err| ContourMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    Ok(gray_from_dynamic_image(&img))
}

//! Frame input types.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows, as delivered by most
//! camera capture APIs.

use crate::util::{ContourMatchError, ContourMatchResult};
use image::GrayImage;

pub mod io;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> ContourMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> ContourMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(ContourMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }
}

impl ImageView<'_, u8> {
    /// Copies the view into a tightly packed grayscale image.
    pub fn to_gray_image(&self) -> ContourMatchResult<GrayImage> {
        let invalid = ContourMatchError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };
        let width = u32::try_from(self.width).map_err(|_| invalid.clone())?;
        let height = u32::try_from(self.height).map_err(|_| invalid.clone())?;
        let len = self.width * self.height;
        let raw = if self.stride() == self.width {
            self.data.get(..len).ok_or_else(|| invalid.clone())?.to_vec()
        } else {
            let mut raw = Vec::with_capacity(len);
            for y in 0..self.height {
                raw.extend_from_slice(self.row(y).ok_or_else(|| invalid.clone())?);
            }
            raw
        };
        GrayImage::from_raw(width, height, raw).ok_or(invalid)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> ContourMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(ContourMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(ContourMatchError::InvalidStride { width, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(ContourMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}

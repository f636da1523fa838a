//! Frame preprocessing and binarization.

use crate::process::ProcessorConfig;
use crate::trace::trace_span;
use image::{GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

/// Binary image ready for contour tracing.
pub(crate) struct Prepared {
    /// Foreground is 255, background 0.
    pub binary: GrayImage,
    /// Dilated edge map, present when the noise filter is on.
    pub edges: Option<GrayImage>,
}

/// Window side used for an adaptive threshold block size setting.
///
/// Saturates at `u32::MAX`, which is itself odd.
pub fn threshold_window(block_size: u32) -> u32 {
    block_size
        .saturating_add(block_size % 2)
        .saturating_add(1)
}

/// Runs equalization, blur and thresholding as configured.
pub(crate) fn preprocess(gray: &GrayImage, cfg: &ProcessorConfig) -> Prepared {
    let _span = trace_span!("preprocess", width = gray.width(), height = gray.height()).entered();

    let equalized;
    let mut work = gray;
    if cfg.equalize_hist {
        equalized = equalize_histogram(work);
        work = &equalized;
    }
    let blurred;
    if cfg.blur {
        blurred = gaussian_blur_f32(work, cfg.blur_sigma);
        work = &blurred;
    }

    let mut binary = adaptive_threshold_mean_c(
        work,
        threshold_window(cfg.adaptive_threshold_block_size),
        cfg.adaptive_threshold_parameter,
    );
    let edges = if cfg.noise_filter {
        let edges = canny(work, cfg.canny_threshold, cfg.canny_threshold);
        for (b, e) in binary.iter_mut().zip(edges.iter()) {
            *b |= *e;
        }
        Some(dilate(&edges, Norm::LInf, 1))
    } else {
        None
    };

    Prepared { binary, edges }
}

/// Inverted mean-C adaptive threshold.
///
/// A pixel becomes foreground (255) when it is at most the mean of its
/// `window x window` neighbourhood minus `c`, so dark strokes on a light
/// background come out white. The neighbourhood is clipped at the borders.
pub fn adaptive_threshold_mean_c(image: &GrayImage, window: u32, c: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    let w = width as usize;
    let h = height as usize;
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let radius = (window / 2) as usize;
    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1) + 1;
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1) + 1;
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as f64;
            let value = f64::from(image.get_pixel(x as u32, y as u32)[0]);
            if value <= sum as f64 / count - c {
                out.put_pixel(x as u32, y as u32, Luma([255]));
            }
        }
    }
    out
}

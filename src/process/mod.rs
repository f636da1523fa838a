//! Frame processing: binarization, contour extraction and recognition.
//!
//! An [`ImageProcessor`] owns its configuration, a handle to the shared
//! template store and a [`ProcessorState`]. Each call to
//! [`ImageProcessor::process_image`] runs one complete pass and publishes it
//! as an immutable [`PassSnapshot`] that readers obtain through a
//! [`SnapshotReader`].

pub mod autogen;
pub(crate) mod contours;
pub(crate) mod preprocess;
mod processor;

pub use autogen::{auto_generate, AutoGenReport};
pub use processor::{ImageProcessor, ProcessorState, SnapshotReader};

use crate::geometry::Contour;
use crate::search::{FinderConfig, FoundTemplate};
use crate::template::{Sample, TemplateStore};
use crate::util::{ContourMatchError, ContourMatchResult};
use image::GrayImage;
use std::sync::{Arc, RwLock};

/// Largest accepted `adaptive_threshold_block_size`.
pub const MAX_ADAPTIVE_THRESHOLD_BLOCK_SIZE: u32 = 1024;

/// Shared template store. Passes take the read lock while matching; authoring
/// takes the write lock.
pub type TemplatesHandle = Arc<RwLock<TemplateStore>>;

/// Configuration for [`ImageProcessor`].
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorConfig {
    /// Equalize the histogram before thresholding.
    pub equalize_hist: bool,
    /// Smooth the frame with a Gaussian before thresholding.
    pub blur: bool,
    /// Gaussian standard deviation in pixels.
    pub blur_sigma: f32,
    /// Add Canny edges to the binary image and require contours to touch them.
    pub noise_filter: bool,
    /// Adaptive threshold neighbourhood; the window side is
    /// `size + size % 2 + 1`.
    pub adaptive_threshold_block_size: u32,
    /// Constant subtracted from the neighbourhood mean.
    pub adaptive_threshold_parameter: f64,
    /// Canny hysteresis threshold (used for both bounds).
    pub canny_threshold: f32,
    /// Minimum enclosed contour area in square pixels.
    pub min_contour_area: f64,
    /// Minimum number of contour points.
    pub min_contour_length: usize,
    /// Minimum ratio of area to point count; rejects thin, noisy contours.
    pub min_form_factor: f64,
    /// Largest contour area as a fraction of the frame area.
    pub max_area_fraction: f64,
    /// Apply the area, form factor and frame fraction filters.
    pub filter_contours_by_size: bool,
    /// Extract contours and samples but skip template matching.
    pub only_find_contours: bool,
    /// Process contours in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
    /// Template finder settings.
    pub finder: FinderConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            equalize_hist: false,
            blur: true,
            blur_sigma: 1.0,
            noise_filter: false,
            adaptive_threshold_block_size: 4,
            adaptive_threshold_parameter: 1.2,
            canny_threshold: 50.0,
            min_contour_area: 10.0,
            min_contour_length: 15,
            min_form_factor: 0.5,
            max_area_fraction: 0.2,
            filter_contours_by_size: true,
            only_find_contours: false,
            parallel: true,
            finder: FinderConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Checks that every field is in range.
    pub fn validate(&self) -> ContourMatchResult<()> {
        if !(self.blur_sigma > 0.0 && self.blur_sigma.is_finite()) {
            return Err(ContourMatchError::InvalidConfig {
                field: "blur_sigma",
                reason: "must be finite and positive",
            });
        }
        if self.adaptive_threshold_block_size > MAX_ADAPTIVE_THRESHOLD_BLOCK_SIZE {
            return Err(ContourMatchError::InvalidConfig {
                field: "adaptive_threshold_block_size",
                reason: "must be at most 1024",
            });
        }
        if !self.adaptive_threshold_parameter.is_finite() {
            return Err(ContourMatchError::InvalidConfig {
                field: "adaptive_threshold_parameter",
                reason: "must be finite",
            });
        }
        if !(self.canny_threshold > 0.0 && self.canny_threshold.is_finite()) {
            return Err(ContourMatchError::InvalidConfig {
                field: "canny_threshold",
                reason: "must be finite and positive",
            });
        }
        if !(self.min_contour_area >= 0.0 && self.min_contour_area.is_finite()) {
            return Err(ContourMatchError::InvalidConfig {
                field: "min_contour_area",
                reason: "must be finite and non-negative",
            });
        }
        if !(self.min_form_factor >= 0.0 && self.min_form_factor.is_finite()) {
            return Err(ContourMatchError::InvalidConfig {
                field: "min_form_factor",
                reason: "must be finite and non-negative",
            });
        }
        if !(self.max_area_fraction > 0.0 && self.max_area_fraction <= 1.0) {
            return Err(ContourMatchError::InvalidConfig {
                field: "max_area_fraction",
                reason: "must be in (0, 1]",
            });
        }
        self.finder.validate()
    }
}

/// Result of one processing pass.
#[derive(Clone, Debug)]
pub struct PassSnapshot {
    /// Zero-based index of the processed frame.
    pub frame_index: u64,
    /// Binary image the contours were traced on.
    pub binarized: GrayImage,
    /// Contours that survived filtering, in extraction order.
    pub contours: Vec<Contour>,
    /// Samples of the contours that yielded a descriptor, in contour order.
    pub samples: Vec<Arc<Sample>>,
    /// Recognized templates after nested-result suppression.
    pub found: Vec<FoundTemplate>,
    /// Number of contours skipped because no descriptor could be extracted.
    pub skipped: usize,
}

impl Default for PassSnapshot {
    fn default() -> Self {
        Self {
            frame_index: 0,
            binarized: GrayImage::new(0, 0),
            contours: Vec::new(),
            samples: Vec::new(),
            found: Vec::new(),
            skipped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProcessorConfig;
    use crate::ContourMatchError;

    #[test]
    fn default_config_is_valid() {
        ProcessorConfig::default().validate().unwrap();
    }

    #[test]
    fn nested_finder_config_is_validated() {
        let mut cfg = ProcessorConfig::default();
        cfg.finder.min_icf = 1.5;
        assert_eq!(
            cfg.validate().unwrap_err(),
            ContourMatchError::InvalidConfig {
                field: "min_icf",
                reason: "must be in [0, 1]"
            }
        );
    }

    #[test]
    fn rejects_oversized_threshold_block() {
        let cfg = ProcessorConfig {
            adaptive_threshold_block_size: u32::MAX,
            ..ProcessorConfig::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err(),
            ContourMatchError::InvalidConfig {
                field: "adaptive_threshold_block_size",
                reason: "must be at most 1024"
            }
        );

        let cfg = ProcessorConfig {
            adaptive_threshold_block_size: super::MAX_ADAPTIVE_THRESHOLD_BLOCK_SIZE,
            ..ProcessorConfig::default()
        };
        cfg.validate().unwrap();
    }
}

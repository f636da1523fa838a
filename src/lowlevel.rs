//! Low-level building blocks for custom recognition pipelines.
//!
//! These helpers expose the binarization, correlation and refinement steps
//! used by [`ImageProcessor`](crate::ImageProcessor). Most users should prefer
//! the processor and [`TemplateFinder`](crate::TemplateFinder).

pub use crate::process::preprocess::{adaptive_threshold_mean_c, threshold_window};
pub use crate::refine::quad1d::quad_peak_offset_1d;
pub use crate::util::math::{circular_dot, Complex};

//! Template search for query samples.
//!
//! The finder compares one query sample against every template sample of a
//! store, filtering cheaply on the ACF summary and scale before computing the
//! ACF similarity and the rotation-resolving inter-correlation.

mod finder;

pub use finder::TemplateFinder;

use crate::template::{Sample, Template};
use crate::util::{ContourMatchError, ContourMatchResult};
use std::f64::consts::{FRAC_PI_4, PI};
use std::sync::Arc;

/// Template name that marks known false positives.
pub const DEFAULT_ANTI_PATTERN_NAME: &str = "antipattern";

/// Configuration for [`TemplateFinder`].
#[derive(Clone, Debug, PartialEq)]
pub struct FinderConfig {
    /// Largest accepted rotation in radians; `PI` accepts any rotation.
    pub max_rotate_angle: f64,
    /// Largest accepted difference between ACF summary coefficients.
    pub max_acf_descriptor_deviation: i32,
    /// Minimum ACF similarity.
    pub min_acf: f64,
    /// Minimum inter-correlation rate.
    pub min_icf: f64,
    /// Enforce `min_acf`.
    pub check_acf: bool,
    /// Enforce `min_icf` and rank by the inter-correlation rate.
    pub check_icf: bool,
    /// Smallest accepted query/template size ratio.
    pub min_scale: f64,
    /// Largest accepted query/template size ratio.
    pub max_scale: f64,
    /// A match against this template is reported as no match. Empty disables.
    pub anti_pattern_name: String,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_rotate_angle: FRAC_PI_4,
            max_acf_descriptor_deviation: 4,
            min_acf: 0.96,
            min_icf: 0.85,
            check_acf: true,
            check_icf: true,
            min_scale: 0.0,
            max_scale: f64::INFINITY,
            anti_pattern_name: DEFAULT_ANTI_PATTERN_NAME.to_owned(),
        }
    }
}

impl FinderConfig {
    /// Checks that every field is in range.
    pub fn validate(&self) -> ContourMatchResult<()> {
        if !(self.max_rotate_angle > 0.0 && self.max_rotate_angle <= PI) {
            return Err(ContourMatchError::InvalidConfig {
                field: "max_rotate_angle",
                reason: "must be in (0, pi]",
            });
        }
        if self.max_acf_descriptor_deviation < 0 {
            return Err(ContourMatchError::InvalidConfig {
                field: "max_acf_descriptor_deviation",
                reason: "must be non-negative",
            });
        }
        if !(0.0..=1.0).contains(&self.min_acf) {
            return Err(ContourMatchError::InvalidConfig {
                field: "min_acf",
                reason: "must be in [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.min_icf) {
            return Err(ContourMatchError::InvalidConfig {
                field: "min_icf",
                reason: "must be in [0, 1]",
            });
        }
        if !(self.min_scale >= 0.0 && self.min_scale.is_finite()) {
            return Err(ContourMatchError::InvalidConfig {
                field: "min_scale",
                reason: "must be finite and non-negative",
            });
        }
        if !(self.max_scale >= self.min_scale) {
            return Err(ContourMatchError::InvalidConfig {
                field: "max_scale",
                reason: "must not be below min_scale",
            });
        }
        Ok(())
    }
}

/// Best template match for one query sample.
#[derive(Clone, Debug, PartialEq)]
pub struct FoundTemplate {
    /// Matched template.
    pub template: Arc<Template>,
    /// Index of the template in the store at match time.
    pub template_index: usize,
    /// Index of the matched exemplar inside the template.
    pub template_sample: usize,
    /// The query sample.
    pub sample: Arc<Sample>,
    /// Ranking score in `[0, 1]`.
    pub rate: f64,
    /// ACF similarity in `[0, 1]`.
    pub acf_rate: f64,
    /// Rotation from template to query in radians, counter-clockwise on screen.
    pub angle: f64,
    /// Query size over template size.
    pub scale: f64,
}

impl FoundTemplate {
    /// Returns the rotation in degrees.
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Returns the matched template name.
    pub fn name(&self) -> &str {
        self.template.name()
    }
}

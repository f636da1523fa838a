//! Template samples, named templates and the template store.

mod serial;
mod store;

pub use store::TemplateStore;

use crate::descriptor::{extract, Descriptor};
use crate::geometry::{BoundingBox, Contour};
use crate::util::{ContourMatchError, ContourMatchResult};

/// A contour paired with its descriptor.
///
/// Used both as a template exemplar and as a live query.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    contour: Contour,
    descriptor: Descriptor,
    bbox: BoundingBox,
}

impl Sample {
    /// Builds a sample by extracting the descriptor of `contour`.
    pub fn from_contour(contour: Contour, sample_count: usize) -> ContourMatchResult<Self> {
        let descriptor = extract(&contour, sample_count)?;
        Self::from_parts(contour, descriptor)
    }

    pub(crate) fn from_parts(contour: Contour, descriptor: Descriptor) -> ContourMatchResult<Self> {
        let bbox = contour
            .bounding_box()
            .ok_or(ContourMatchError::DegenerateContour {
                reason: "empty contour",
            })?;
        Ok(Self {
            contour,
            descriptor,
            bbox,
        })
    }

    /// Returns the source contour in image coordinates.
    pub fn contour(&self) -> &Contour {
        &self.contour
    }

    /// Returns the shape descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Returns the bounding box of the source contour.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

/// A named class of recognizable shapes with one or more exemplars.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    name: String,
    samples: Vec<Sample>,
    preferred_angle_no_more_90: bool,
}

impl Template {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            samples: Vec::new(),
            preferred_angle_no_more_90: false,
        }
    }

    /// Returns the template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the exemplar samples in insertion order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Returns true if matches rotated by 90 degrees or more are rejected.
    ///
    /// Useful for glyphs such as `6`/`9` that differ only by a half turn.
    pub fn preferred_angle_no_more_90(&self) -> bool {
        self.preferred_angle_no_more_90
    }

    /// Returns true if the name designates an image overlay asset rather
    /// than a text label.
    pub fn is_overlay_asset(&self) -> bool {
        let lower = self.name.to_ascii_lowercase();
        lower.ends_with(".png") || lower.ends_with(".jpg")
    }
}

//! Shape descriptors for contour matching.
//!
//! A contour is oriented counter-clockwise, resampled to a fixed number of
//! points equally spaced by arc length, and turned into a sequence of complex
//! edge vectors. Dividing the edges by their norm removes scale; working with
//! edge differences removes translation. Two features are derived:
//!
//! - the autocorrelation function (ACF) of the edges, which is additionally
//!   invariant to rotation and to the choice of start point, and is cheap to
//!   compare;
//! - the edges themselves, compared by circular inter-correlation (ICF),
//!   which resolves the rotation between two shapes and separates shapes
//!   whose ACFs are alike.

mod correlation;

pub use correlation::Correlation;

use crate::geometry::Contour;
use crate::util::{Complex, ContourMatchError, ContourMatchResult};

/// Default number of resampled points per contour.
pub const DEFAULT_SAMPLE_COUNT: usize = 30;

/// Smallest supported number of resampled points.
pub const MIN_SAMPLE_COUNT: usize = 8;

/// Allowed drift between persisted and recomputed descriptor values.
const PERSISTED_TOLERANCE: f64 = 1e-9;

/// Quarter-band filters folding the ACF magnitudes into four coefficients.
const ACF_FILTERS: [[f64; 4]; 4] = [
    [1.0, 1.0, 1.0, 1.0],
    [-1.0, -1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0, 1.0],
];

/// Normalized, fixed-length shape descriptor of one contour.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    edges: Vec<Complex>,
    acf: Vec<Complex>,
    acf_descriptor: [i32; 4],
    norm: f64,
}

impl Descriptor {
    /// Rebuilds a descriptor from persisted parts, checking their consistency.
    pub(crate) fn from_parts(
        edges: Vec<Complex>,
        acf: Vec<Complex>,
        acf_descriptor: [i32; 4],
        norm: f64,
    ) -> Result<Self, &'static str> {
        if edges.len() < MIN_SAMPLE_COUNT {
            return Err("descriptor has too few samples");
        }
        if acf.len() != edges.len() / 2 {
            return Err("acf length does not match sample count");
        }
        if !norm.is_finite() || norm <= 0.0 {
            return Err("descriptor norm must be positive");
        }
        if !edges.iter().chain(acf.iter()).all(|c| c.is_finite()) {
            return Err("descriptor contains non-finite values");
        }
        let energy: f64 = edges.iter().map(|e| e.norm_sqr()).sum();
        if (energy - 1.0).abs() > PERSISTED_TOLERANCE {
            return Err("descriptor edges are not unit norm");
        }
        let expected = autocorrelation(&edges);
        let acf_matches = expected
            .iter()
            .zip(acf.iter())
            .all(|(&a, &b)| (a - b).norm() <= PERSISTED_TOLERANCE);
        if !acf_matches {
            return Err("acf does not match descriptor edges");
        }
        if summarize_acf(&expected) != acf_descriptor {
            return Err("acf summary does not match descriptor edges");
        }
        Ok(Self {
            edges,
            acf,
            acf_descriptor,
            norm,
        })
    }

    /// Returns the number of resampled points.
    pub fn sample_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the unit-norm edge vectors.
    pub fn edges(&self) -> &[Complex] {
        &self.edges
    }

    /// Returns the normalized autocorrelation for shifts `0..sample_count / 2`.
    pub fn acf(&self) -> &[Complex] {
        &self.acf
    }

    /// Returns the four integer ACF summary coefficients.
    pub fn acf_descriptor(&self) -> [i32; 4] {
        self.acf_descriptor
    }

    /// Returns the norm of the un-normalized edges (proportional to size).
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Largest absolute difference between the ACF summary coefficients.
    pub fn acf_deviation(&self, other: &Descriptor) -> i32 {
        self.acf_descriptor
            .iter()
            .zip(other.acf_descriptor.iter())
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .map_or(0, |d| i32::try_from(d).unwrap_or(i32::MAX))
    }

    /// Normalized ACF similarity in `[0, 1]`.
    ///
    /// Returns 0 when the descriptors have different lengths.
    pub fn acf_similarity(&self, other: &Descriptor) -> f64 {
        if self.acf.len() != other.acf.len() {
            return 0.0;
        }
        let mut dot = Complex::ZERO;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for (&a, &b) in self.acf.iter().zip(other.acf.iter()) {
            dot += a * b.conj();
            norm_a += a.norm_sqr();
            norm_b += b.norm_sqr();
        }
        let denom = (norm_a * norm_b).sqrt();
        if denom <= 0.0 {
            return 0.0;
        }
        (dot.norm() / denom).min(1.0)
    }
}

/// Extracts a descriptor from a contour.
///
/// Fails with [`ContourMatchError::DegenerateContour`] when the contour has
/// fewer than three distinct points or no length or area, and with
/// [`ContourMatchError::InvalidConfig`] when `sample_count` is below
/// [`MIN_SAMPLE_COUNT`].
pub fn extract(contour: &Contour, sample_count: usize) -> ContourMatchResult<Descriptor> {
    if sample_count < MIN_SAMPLE_COUNT {
        return Err(ContourMatchError::InvalidConfig {
            field: "sample_count",
            reason: "must be at least 8",
        });
    }
    if contour.distinct_points() < 3 {
        return Err(ContourMatchError::DegenerateContour {
            reason: "fewer than three distinct points",
        });
    }
    if contour.perimeter() <= f64::EPSILON {
        return Err(ContourMatchError::DegenerateContour {
            reason: "zero arc length",
        });
    }
    if contour.area() <= f64::EPSILON {
        return Err(ContourMatchError::DegenerateContour {
            reason: "zero enclosed area",
        });
    }

    let points = contour.counter_clockwise().resample(sample_count);
    let n = points.len();
    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        edges.push(Complex::new(b.x - a.x, a.y - b.y));
    }

    let norm = edges.iter().map(|e| e.norm_sqr()).sum::<f64>().sqrt();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return Err(ContourMatchError::DegenerateContour {
            reason: "zero edge energy",
        });
    }
    let inv = 1.0 / norm;
    for e in edges.iter_mut() {
        *e = e.scale(inv);
    }

    let acf = autocorrelation(&edges);
    let acf_descriptor = summarize_acf(&acf);
    Ok(Descriptor {
        edges,
        acf,
        acf_descriptor,
        norm,
    })
}

fn autocorrelation(edges: &[Complex]) -> Vec<Complex> {
    let half = edges.len() / 2;
    (0..half)
        .map(|shift| crate::util::math::circular_dot(edges, edges, shift))
        .collect()
}

fn summarize_acf(acf: &[Complex]) -> [i32; 4] {
    let count = acf.len();
    let mut sums = [0.0f64; 4];
    for (i, value) in acf.iter().enumerate() {
        let band = 4 * i / count;
        let magnitude = value.norm();
        for (sum, filter) in sums.iter_mut().zip(ACF_FILTERS.iter()) {
            *sum += filter[band] * magnitude;
        }
    }
    sums.map(|sum| (100.0 * sum / count as f64) as i32)
}

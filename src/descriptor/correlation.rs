//! Circular inter-correlation between two descriptors.

use crate::descriptor::Descriptor;
use crate::refine::quad1d::quad_peak_offset_1d;
use crate::util::math::circular_dot;
use crate::util::Complex;

/// Best alignment of one descriptor onto another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correlation {
    /// Normalized correlation magnitude in `[0, 1]`.
    pub rate: f64,
    /// Rotation in radians carrying the reference onto the query,
    /// counter-clockwise on screen.
    pub angle: f64,
    /// Start-point shift in samples, refined to sub-sample precision.
    pub shift: f64,
}

impl Descriptor {
    /// Correlates `query` against `self` over every start-point shift.
    ///
    /// Only shifts whose rotation lies within `±max_angle` radians are
    /// considered. The best one is refined with a parabolic fit over its
    /// neighbours. Returns `None` when lengths differ, `max_angle` is NaN or
    /// no shift falls inside the window.
    pub fn inter_correlation(&self, query: &Descriptor, max_angle: f64) -> Option<Correlation> {
        let n = self.edges.len();
        if n == 0 || query.edges.len() != n || max_angle.is_nan() {
            return None;
        }

        let values: Vec<Complex> = (0..n)
            .map(|shift| circular_dot(&query.edges, &self.edges, shift))
            .collect();

        let limit = max_angle.abs() + 1e-9;
        let mut best: Option<usize> = None;
        for (shift, value) in values.iter().enumerate() {
            if value.arg().abs() > limit {
                continue;
            }
            match best {
                Some(idx) if values[idx].norm() >= value.norm() => {}
                _ => best = Some(shift),
            }
        }
        let k = best?;

        let prev = values[(k + n - 1) % n];
        let next = values[(k + 1) % n];
        let center = values[k];
        let offset = quad_peak_offset_1d(prev.norm(), center.norm(), next.norm()).unwrap_or(0.0);
        let refined = if offset >= 0.0 {
            center.scale(1.0 - offset) + next.scale(offset)
        } else {
            center.scale(1.0 + offset) + prev.scale(-offset)
        };
        // Interpolation may carry the phase just past the window edge.
        let window = max_angle.abs();
        let angle = if refined.norm() > 0.0 {
            refined.arg()
        } else {
            center.arg()
        }
        .clamp(-window, window);

        Some(Correlation {
            rate: center.norm().min(1.0),
            angle,
            shift: k as f64 + offset,
        })
    }
}

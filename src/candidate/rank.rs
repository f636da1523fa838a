//! Deterministic ranking of finder candidates.

use std::cmp::Ordering;

/// One accepted template sample for a query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    /// Ranking score (ICF rate, or ACF rate when ICF is not checked).
    pub score: f64,
    /// ACF similarity, used to break score ties.
    pub acf_rate: f64,
    /// Index of the template in the store.
    pub template_index: usize,
    /// Index of the sample inside the template.
    pub sample_index: usize,
    /// Rotation from template to query in radians.
    pub angle: f64,
    /// Query size over template size.
    pub scale: f64,
}

/// Orders candidates best first: score, then ACF rate, then store position.
pub(crate) fn candidate_cmp_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.acf_rate.total_cmp(&a.acf_rate))
        .then_with(|| a.template_index.cmp(&b.template_index))
        .then_with(|| a.sample_index.cmp(&b.sample_index))
}

/// Keeps the best candidate seen so far.
#[derive(Debug, Default)]
pub(crate) struct Best {
    best: Option<Candidate>,
}

impl Best {
    pub fn push(&mut self, candidate: Candidate) {
        match &self.best {
            Some(current) if candidate_cmp_desc(&candidate, current) != Ordering::Less => {}
            _ => self.best = Some(candidate),
        }
    }

    pub fn into_inner(self) -> Option<Candidate> {
        self.best
    }
}

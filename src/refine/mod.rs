//! Sub-sample refinement of correlation peaks.

pub(crate) mod quad1d;

//! Candidate selection and pruning utilities.
//!
//! Includes deterministic ranking of finder candidates and suppression of
//! results nested inside larger ones.

pub(crate) mod nms;
pub(crate) mod rank;

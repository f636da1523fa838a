//! Batch template generation from labeled images.
//!
//! Each image is expected to show one shape, e.g. a glyph rendered on a
//! light background. The image goes through the same binarization and
//! contour filters as live frames, and the largest surviving contour becomes
//! a sample of the template named by the label.

use crate::process::contours::extract_contours;
use crate::process::preprocess::preprocess;
use crate::process::ProcessorConfig;
use crate::template::{Sample, TemplateStore};
use crate::trace::{trace_event, trace_span};
use crate::util::ContourMatchResult;
use image::GrayImage;

/// Outcome of [`auto_generate`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoGenReport {
    /// Labels that received a new sample, in input order.
    pub added: Vec<String>,
    /// Labels whose image yielded no usable contour.
    pub skipped: Vec<String>,
}

/// Adds one sample per labeled image to `store`.
///
/// Images without a usable contour are reported as skipped. Fails only on an
/// invalid configuration or an empty label, in which case `store` is left
/// unchanged.
pub fn auto_generate<I, S>(
    store: &mut TemplateStore,
    cfg: &ProcessorConfig,
    labeled: I,
) -> ContourMatchResult<AutoGenReport>
where
    I: IntoIterator<Item = (S, GrayImage)>,
    S: Into<String>,
{
    cfg.validate()?;
    let _span = trace_span!("auto_generate").entered();

    // Applied to `store` only once the whole batch succeeded.
    let mut staged = store.clone();
    let mut report = AutoGenReport::default();
    for (label, image) in labeled {
        let label = label.into();
        match largest_sample(&image, cfg, staged.sample_count()) {
            Some(sample) => {
                staged.add_prepared_sample(&label, sample)?;
                report.added.push(label);
            }
            None => {
                trace_event!("autogen_skipped", label = label.as_str());
                report.skipped.push(label);
            }
        }
    }
    *store = staged;
    trace_event!(
        "autogen_complete",
        added = report.added.len(),
        skipped = report.skipped.len()
    );
    Ok(report)
}

fn largest_sample(image: &GrayImage, cfg: &ProcessorConfig, sample_count: usize) -> Option<Sample> {
    if image.width() == 0 || image.height() == 0 {
        return None;
    }
    let prepared = preprocess(image, cfg);
    extract_contours(&prepared, cfg)
        .into_iter()
        .filter_map(|contour| Sample::from_contour(contour, sample_count).ok())
        .max_by(|a, b| a.contour().area().total_cmp(&b.contour().area()))
}

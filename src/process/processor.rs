//! The per-frame processing loop and snapshot publication.

use crate::candidate::nms::suppress_nested;
use crate::geometry::Contour;
use crate::image::ImageView;
use crate::process::contours::extract_contours;
use crate::process::preprocess::preprocess;
use crate::process::{PassSnapshot, ProcessorConfig, TemplatesHandle};
use crate::search::{FoundTemplate, TemplateFinder};
use crate::template::{Sample, TemplateStore};
use crate::trace::{trace_event, trace_span};
use crate::util::{ContourMatchError, ContourMatchResult};
use image::{DynamicImage, GrayImage};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::{Arc, PoisonError, RwLock};

/// Mutable state of one processor: frame counter and the latest pass.
#[derive(Debug)]
pub struct ProcessorState {
    frame_count: u64,
    latest: Arc<RwLock<Arc<PassSnapshot>>>,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self {
            frame_count: 0,
            latest: Arc::new(RwLock::new(Arc::new(PassSnapshot::default()))),
        }
    }
}

impl ProcessorState {
    /// Number of frames processed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Most recently published pass.
    pub fn latest(&self) -> Arc<PassSnapshot> {
        Arc::clone(&self.latest.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&mut self, snapshot: Arc<PassSnapshot>) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.frame_count += 1;
    }
}

/// Cloneable read access to the latest published pass.
///
/// A reader always observes a complete pass, never a partially built one.
#[derive(Clone, Debug)]
pub struct SnapshotReader {
    inner: Arc<RwLock<Arc<PassSnapshot>>>,
}

impl SnapshotReader {
    /// Returns the latest published pass.
    pub fn latest(&self) -> Arc<PassSnapshot> {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Binarizes frames, extracts contours and recognizes them.
#[derive(Debug)]
pub struct ImageProcessor {
    cfg: ProcessorConfig,
    finder: TemplateFinder,
    templates: TemplatesHandle,
    state: ProcessorState,
}

impl ImageProcessor {
    /// Creates a processor sharing `templates` with other owners.
    pub fn new(cfg: ProcessorConfig, templates: TemplatesHandle) -> ContourMatchResult<Self> {
        cfg.validate()?;
        let finder = TemplateFinder::new(cfg.finder.clone())?;
        Ok(Self {
            cfg,
            finder,
            templates,
            state: ProcessorState::default(),
        })
    }

    /// Creates a processor owning a new handle to `store`.
    pub fn with_store(cfg: ProcessorConfig, store: TemplateStore) -> ContourMatchResult<Self> {
        Self::new(cfg, Arc::new(RwLock::new(store)))
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ProcessorConfig {
        &self.cfg
    }

    /// Replaces the configuration; an invalid one is rejected and the
    /// previous configuration stays active.
    pub fn apply_config(&mut self, cfg: ProcessorConfig) -> ContourMatchResult<()> {
        cfg.validate()?;
        self.finder = TemplateFinder::new(cfg.finder.clone())?;
        self.cfg = cfg;
        Ok(())
    }

    /// Returns the shared template store handle.
    pub fn templates(&self) -> TemplatesHandle {
        Arc::clone(&self.templates)
    }

    /// Runs `edit` with exclusive access to the template store.
    ///
    /// Holding the write lock keeps matching from observing a half-edited
    /// store.
    pub fn edit_templates<R>(&self, edit: impl FnOnce(&mut TemplateStore) -> R) -> R {
        let mut store = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        edit(&mut store)
    }

    /// Returns the processor state.
    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    /// Returns a reader for the latest published pass.
    pub fn snapshot_reader(&self) -> SnapshotReader {
        SnapshotReader {
            inner: Arc::clone(&self.state.latest),
        }
    }

    /// Processes a borrowed 8-bit grayscale frame.
    pub fn process_image(
        &mut self,
        frame: ImageView<'_, u8>,
    ) -> ContourMatchResult<Arc<PassSnapshot>> {
        let gray = frame.to_gray_image()?;
        self.process_gray(&gray)
    }

    /// Processes a decoded image of any color type.
    pub fn process_dynamic(
        &mut self,
        frame: &DynamicImage,
    ) -> ContourMatchResult<Arc<PassSnapshot>> {
        self.process_gray(&frame.to_luma8())
    }

    /// Processes a grayscale frame and publishes the result.
    pub fn process_gray(&mut self, frame: &GrayImage) -> ContourMatchResult<Arc<PassSnapshot>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(ContourMatchError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            });
        }
        let frame_index = self.state.frame_count;
        let _span = trace_span!("process_image", frame = frame_index).entered();

        let prepared = preprocess(frame, &self.cfg);
        let contours = extract_contours(&prepared, &self.cfg);

        let store = self.templates.read().unwrap_or_else(PoisonError::into_inner);
        let (samples, skipped) = build_samples(&contours, store.sample_count(), self.cfg.parallel);
        let found = if self.cfg.only_find_contours {
            Vec::new()
        } else {
            self.match_samples(&store, &samples)
        };
        drop(store);

        trace_event!(
            "pass_complete",
            contours = contours.len(),
            skipped = skipped,
            found = found.len()
        );
        let snapshot = Arc::new(PassSnapshot {
            frame_index,
            binarized: prepared.binary,
            contours,
            samples,
            found,
            skipped,
        });
        self.state.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    fn match_samples(&self, store: &TemplateStore, samples: &[Arc<Sample>]) -> Vec<FoundTemplate> {
        let _span = trace_span!("match_samples", samples = samples.len()).entered();
        let found: Vec<FoundTemplate> = map_in_order(samples, self.cfg.parallel, |sample| {
            self.finder.find(store, sample)
        })
        .into_iter()
        .flatten()
        .collect();
        suppress_nested(found, |f| f.sample.bounding_box(), |f| f.rate)
    }
}

fn build_samples(
    contours: &[Contour],
    sample_count: usize,
    parallel: bool,
) -> (Vec<Arc<Sample>>, usize) {
    let results = map_in_order(contours, parallel, |contour| {
        Sample::from_contour(contour.clone(), sample_count)
    });
    let mut samples = Vec::with_capacity(results.len());
    let mut skipped = 0usize;
    for result in results {
        match result {
            Ok(sample) => samples.push(Arc::new(sample)),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        trace_event!("degenerate_contours", skipped = skipped);
    }
    (samples, skipped)
}

/// Maps `items` in parallel when enabled; output order follows input order.
#[cfg(feature = "rayon")]
fn map_in_order<T, U, F>(items: &[T], parallel: bool, f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn map_in_order<T, U, F>(items: &[T], _parallel: bool, f: F) -> Vec<U>
where
    F: Fn(&T) -> U,
{
    items.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::ImageProcessor;
    use crate::process::ProcessorConfig;
    use crate::template::TemplateStore;
    use crate::ContourMatchError;
    use image::GrayImage;

    #[test]
    fn invalid_config_keeps_previous() {
        let mut processor =
            ImageProcessor::with_store(ProcessorConfig::default(), TemplateStore::new()).unwrap();
        let bad = ProcessorConfig {
            max_area_fraction: 0.0,
            ..ProcessorConfig::default()
        };
        assert!(matches!(
            processor.apply_config(bad),
            Err(ContourMatchError::InvalidConfig {
                field: "max_area_fraction",
                ..
            })
        ));
        assert_eq!(processor.config(), &ProcessorConfig::default());
    }

    #[test]
    fn blank_frame_publishes_empty_pass() {
        let mut processor =
            ImageProcessor::with_store(ProcessorConfig::default(), TemplateStore::new()).unwrap();
        let reader = processor.snapshot_reader();
        let frame = GrayImage::from_pixel(64, 48, image::Luma([255]));

        let first = processor.process_gray(&frame).unwrap();
        let second = processor.process_gray(&frame).unwrap();
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
        assert!(second.contours.is_empty());
        assert!(second.found.is_empty());
        assert_eq!(reader.latest().frame_index, 1);
        assert_eq!(processor.state().frame_count(), 2);
    }

    #[test]
    fn empty_frame_is_rejected() {
        let mut processor =
            ImageProcessor::with_store(ProcessorConfig::default(), TemplateStore::new()).unwrap();
        assert!(matches!(
            processor.process_gray(&GrayImage::new(0, 0)),
            Err(ContourMatchError::InvalidDimensions { .. })
        ));
    }
}

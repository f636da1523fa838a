//! Matching of one query sample against a template store.

use crate::candidate::rank::{Best, Candidate};
use crate::descriptor::Descriptor;
use crate::search::{FinderConfig, FoundTemplate};
use crate::template::{Sample, Template, TemplateStore};
use crate::util::ContourMatchResult;
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

/// Largest rotation window for templates that reject half turns.
const SMALL_ANGLE_LIMIT: f64 = FRAC_PI_2 - 1e-6;

/// Finds the best template for query samples.
#[derive(Clone, Debug, Default)]
pub struct TemplateFinder {
    cfg: FinderConfig,
}

impl TemplateFinder {
    /// Creates a finder after validating `cfg`.
    pub fn new(cfg: FinderConfig) -> ContourMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FinderConfig {
        &self.cfg
    }

    /// Returns the best template for `query`, or `None` if nothing passes
    /// the thresholds or the winner is the anti-pattern template.
    ///
    /// Template samples are visited in store order. Ties on the score are
    /// broken by ACF similarity, then by template and sample index.
    pub fn find(&self, store: &TemplateStore, query: &Arc<Sample>) -> Option<FoundTemplate> {
        let descriptor = query.descriptor();
        let mut best = Best::default();
        for (template_index, template) in store.iter().enumerate() {
            let window = self.rotation_window(template);
            for (sample_index, sample) in template.samples().iter().enumerate() {
                if let Some(candidate) = self.evaluate(
                    sample.descriptor(),
                    descriptor,
                    window,
                    template_index,
                    sample_index,
                ) {
                    best.push(candidate);
                }
            }
        }

        let winner = best.into_inner()?;
        let template = store.template(winner.template_index)?;
        if !self.cfg.anti_pattern_name.is_empty()
            && template.name() == self.cfg.anti_pattern_name
        {
            return None;
        }
        Some(FoundTemplate {
            template: Arc::clone(template),
            template_index: winner.template_index,
            template_sample: winner.sample_index,
            sample: Arc::clone(query),
            rate: winner.score,
            acf_rate: winner.acf_rate,
            angle: winner.angle,
            scale: winner.scale,
        })
    }

    fn rotation_window(&self, template: &Template) -> f64 {
        if template.preferred_angle_no_more_90() {
            self.cfg.max_rotate_angle.min(SMALL_ANGLE_LIMIT)
        } else {
            self.cfg.max_rotate_angle
        }
    }

    fn evaluate(
        &self,
        reference: &Descriptor,
        query: &Descriptor,
        window: f64,
        template_index: usize,
        sample_index: usize,
    ) -> Option<Candidate> {
        if reference.sample_count() != query.sample_count() {
            return None;
        }
        if reference.acf_deviation(query) > self.cfg.max_acf_descriptor_deviation {
            return None;
        }
        let scale = query.norm() / reference.norm();
        if scale < self.cfg.min_scale || scale > self.cfg.max_scale {
            return None;
        }

        let acf_rate = reference.acf_similarity(query);
        if self.cfg.check_acf && acf_rate < self.cfg.min_acf {
            return None;
        }
        let correlation = reference.inter_correlation(query, window)?;
        if self.cfg.check_icf && correlation.rate < self.cfg.min_icf {
            return None;
        }

        let score = if self.cfg.check_icf {
            correlation.rate
        } else {
            acf_rate
        };
        Some(Candidate {
            score,
            acf_rate,
            template_index,
            sample_index,
            angle: correlation.angle,
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateFinder;
    use crate::geometry::{Contour, Point2};
    use crate::search::FinderConfig;
    use crate::template::{Sample, TemplateStore};
    use std::f64::consts::PI;
    use std::sync::Arc;

    // An asymmetric "L" so that rotations are unambiguous.
    fn ell() -> Contour {
        Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(20.0, 0.0),
            Point2::new(20.0, 40.0),
            Point2::new(60.0, 40.0),
            Point2::new(60.0, 60.0),
            Point2::new(0.0, 60.0),
        ])
    }

    fn query(contour: Contour, store: &TemplateStore) -> Arc<Sample> {
        Arc::new(Sample::from_contour(contour, store.sample_count()).unwrap())
    }

    #[test]
    fn half_turn_rejected_for_small_angle_templates() {
        let mut store = TemplateStore::new();
        store.add_sample("L", &ell()).unwrap();
        let finder = TemplateFinder::new(FinderConfig {
            max_rotate_angle: PI,
            ..FinderConfig::default()
        })
        .unwrap();
        let turned = query(ell().transform(PI, 1.0, Point2::new(200.0, 200.0)), &store);

        let found = finder.find(&store, &turned).unwrap();
        assert!((found.angle.abs() - PI).abs() < 0.05);

        store.set_preferred_angle_no_more_90("L", true).unwrap();
        assert!(finder.find(&store, &turned).is_none());
    }

    #[test]
    fn scale_bounds_reject_large_queries() {
        let mut store = TemplateStore::new();
        store.add_sample("L", &ell()).unwrap();
        let big = query(ell().transform(0.0, 3.0, Point2::new(0.0, 0.0)), &store);
        let finder = TemplateFinder::new(FinderConfig {
            max_scale: 2.0,
            ..FinderConfig::default()
        })
        .unwrap();
        assert!(finder.find(&store, &big).is_none());

        let found = TemplateFinder::default().find(&store, &big).unwrap();
        assert!((found.scale - 3.0).abs() < 1e-9);
    }

    #[test]
    fn anti_pattern_winner_means_no_match() {
        let mut store = TemplateStore::new();
        store.add_sample("antipattern", &ell()).unwrap();
        let q = query(ell(), &store);
        assert!(TemplateFinder::default().find(&store, &q).is_none());
    }
}

//! Ordered, name-unique template collection and its authoring operations.

use crate::descriptor::{DEFAULT_SAMPLE_COUNT, MIN_SAMPLE_COUNT};
use crate::geometry::Contour;
use crate::template::{Sample, Template};
use crate::util::{ContourMatchError, ContourMatchResult};
use std::sync::Arc;

/// Ordered collection of templates, unique by name.
///
/// Every descriptor in a store uses the same `sample_count`. Templates are
/// shared through `Arc` so match results keep a stable reference even if
/// the store is edited afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateStore {
    sample_count: usize,
    templates: Vec<Arc<Template>>,
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            templates: Vec::new(),
        }
    }
}

impl TemplateStore {
    /// Creates an empty store with the default sample count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose descriptors use `sample_count` points.
    pub fn with_sample_count(sample_count: usize) -> ContourMatchResult<Self> {
        if sample_count < MIN_SAMPLE_COUNT {
            return Err(ContourMatchError::InvalidConfig {
                field: "sample_count",
                reason: "must be at least 8",
            });
        }
        Ok(Self {
            sample_count,
            templates: Vec::new(),
        })
    }

    pub(crate) fn from_templates(sample_count: usize, templates: Vec<Template>) -> Self {
        Self {
            sample_count,
            templates: templates.into_iter().map(Arc::new).collect(),
        }
    }

    /// Returns the number of resampled points per descriptor.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if the store holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Total number of samples across all templates.
    pub fn sample_total(&self) -> usize {
        self.templates.iter().map(|t| t.samples.len()).sum()
    }

    /// Iterates over templates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template>> + '_ {
        self.templates.iter()
    }

    /// Returns the template at `index`.
    pub fn template(&self, index: usize) -> Option<&Arc<Template>> {
        self.templates.get(index)
    }

    /// Looks up a template by name.
    pub fn get(&self, name: &str) -> Option<&Arc<Template>> {
        self.position(name).map(|idx| &self.templates[idx])
    }

    /// Returns the index of the named template.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.templates.iter().position(|t| t.name == name)
    }

    /// Extracts a descriptor from `contour` and appends it to the named
    /// template, creating the template if absent.
    pub fn add_sample(&mut self, name: &str, contour: &Contour) -> ContourMatchResult<()> {
        let sample = Sample::from_contour(contour.clone(), self.sample_count)?;
        self.add_prepared_sample(name, sample)
    }

    /// Appends an already extracted sample, e.g. one picked from a
    /// processing pass, to the named template.
    pub fn add_prepared_sample(&mut self, name: &str, sample: Sample) -> ContourMatchResult<()> {
        if name.is_empty() {
            return Err(ContourMatchError::InvalidConfig {
                field: "name",
                reason: "must not be empty",
            });
        }
        if sample.descriptor().sample_count() != self.sample_count {
            return Err(ContourMatchError::InvalidConfig {
                field: "sample_count",
                reason: "sample descriptor length differs from the store",
            });
        }
        let idx = match self.position(name) {
            Some(idx) => idx,
            None => {
                self.templates.push(Arc::new(Template::new(name.to_owned())));
                self.templates.len() - 1
            }
        };
        Arc::make_mut(&mut self.templates[idx]).samples.push(sample);
        Ok(())
    }

    /// Renames a template, keeping its position.
    pub fn rename(&mut self, name: &str, new_name: &str) -> ContourMatchResult<()> {
        if new_name.is_empty() {
            return Err(ContourMatchError::InvalidConfig {
                field: "name",
                reason: "must not be empty",
            });
        }
        let idx = self.position_or_err(name)?;
        if name == new_name {
            return Ok(());
        }
        if self.position(new_name).is_some() {
            return Err(ContourMatchError::DuplicateTemplate {
                name: new_name.to_owned(),
            });
        }
        Arc::make_mut(&mut self.templates[idx]).name = new_name.to_owned();
        Ok(())
    }

    /// Removes a template and returns it.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Template>> {
        let idx = self.position(name)?;
        Some(self.templates.remove(idx))
    }

    /// Removes one sample; a template left without samples is removed too.
    pub fn remove_sample(&mut self, name: &str, index: usize) -> ContourMatchResult<Sample> {
        let idx = self.position_or_err(name)?;
        let template = Arc::make_mut(&mut self.templates[idx]);
        if index >= template.samples.len() {
            return Err(ContourMatchError::InvalidConfig {
                field: "index",
                reason: "sample index out of range",
            });
        }
        let sample = template.samples.remove(index);
        if template.samples.is_empty() {
            self.templates.remove(idx);
        }
        Ok(sample)
    }

    /// Sets whether matches of the named template must stay below 90 degrees.
    pub fn set_preferred_angle_no_more_90(
        &mut self,
        name: &str,
        value: bool,
    ) -> ContourMatchResult<()> {
        let idx = self.position_or_err(name)?;
        Arc::make_mut(&mut self.templates[idx]).preferred_angle_no_more_90 = value;
        Ok(())
    }

    /// Removes every template.
    pub fn clear(&mut self) {
        self.templates.clear();
    }

    fn position_or_err(&self, name: &str) -> ContourMatchResult<usize> {
        self.position(name)
            .ok_or_else(|| ContourMatchError::UnknownTemplate {
                name: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateStore;
    use crate::geometry::{Contour, Point2};
    use crate::ContourMatchError;

    fn square(side: f64) -> Contour {
        Contour::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ])
    }

    #[test]
    fn add_sample_groups_by_name() {
        let mut store = TemplateStore::new();
        store.add_sample("A", &square(10.0)).unwrap();
        store.add_sample("B", &square(20.0)).unwrap();
        store.add_sample("A", &square(30.0)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("A").unwrap().samples().len(), 2);
        assert_eq!(store.sample_total(), 3);
        assert_eq!(store.position("B"), Some(1));
    }

    #[test]
    fn rename_rejects_duplicates() {
        let mut store = TemplateStore::new();
        store.add_sample("A", &square(10.0)).unwrap();
        store.add_sample("B", &square(10.0)).unwrap();
        assert_eq!(
            store.rename("A", "B").unwrap_err(),
            ContourMatchError::DuplicateTemplate {
                name: "B".to_owned()
            }
        );
        store.rename("A", "C").unwrap();
        assert_eq!(store.template(0).unwrap().name(), "C");
    }

    #[test]
    fn removing_last_sample_removes_template() {
        let mut store = TemplateStore::new();
        store.add_sample("A", &square(10.0)).unwrap();
        store.remove_sample("A", 0).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.remove_sample("A", 0),
            Err(ContourMatchError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn degenerate_contour_leaves_store_untouched() {
        let mut store = TemplateStore::new();
        let line = Contour::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        assert!(store.add_sample("A", &line).is_err());
        assert!(store.is_empty());
    }
}

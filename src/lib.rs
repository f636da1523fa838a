//! Contourmatch is a contour-based shape recognition library.
//!
//! Frames are binarized with an adaptive threshold, contours are traced and
//! each contour is reduced to a descriptor that is invariant to translation,
//! scale, rotation and start point. Descriptors are matched against a store
//! of named templates; every recognized contour reports the template, the
//! rotation angle and the scale factor. Contours can be processed in parallel
//! via the `rayon` feature.
//!
//! ```no_run
//! use contourmatch::{ImageProcessor, ProcessorConfig, TemplateStore};
//!
//! let store = TemplateStore::load_file("templates.cmts")?;
//! let mut processor = ImageProcessor::with_store(ProcessorConfig::default(), store)?;
//! let frame = contourmatch::image::io::load_gray_image("frame.png")?;
//! for found in &processor.process_gray(&frame)?.found {
//!     println!("{} at {:.1} deg, x{:.2}", found.name(), found.angle_degrees(), found.scale);
//! }
//! # Ok::<(), contourmatch::ContourMatchError>(())
//! ```

mod candidate;
pub mod descriptor;
pub mod geometry;
pub mod image;
pub mod lowlevel;
pub mod process;
mod refine;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use crate::image::ImageView;
pub use descriptor::{extract, Correlation, Descriptor};
pub use geometry::{BoundingBox, Contour, Point2};
pub use process::{
    auto_generate, AutoGenReport, ImageProcessor, PassSnapshot, ProcessorConfig, ProcessorState,
    SnapshotReader, TemplatesHandle,
};
pub use search::{FinderConfig, FoundTemplate, TemplateFinder};
pub use template::{Sample, Template, TemplateStore};
pub use util::{ContourMatchError, ContourMatchResult};

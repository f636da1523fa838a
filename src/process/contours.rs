//! Contour tracing and filtering on the binary image.

use crate::geometry::{Contour, Point2};
use crate::process::preprocess::Prepared;
use crate::process::ProcessorConfig;
use crate::trace::{trace_event, trace_span};
use image::GrayImage;
use imageproc::contours::find_contours;

/// Traces outer and hole borders and keeps those passing the filters.
pub(crate) fn extract_contours(prepared: &Prepared, cfg: &ProcessorConfig) -> Vec<Contour> {
    let _span = trace_span!("extract_contours").entered();
    let (width, height) = prepared.binary.dimensions();
    let frame_area = f64::from(width) * f64::from(height);

    let traced = find_contours::<i32>(&prepared.binary);
    let traced_count = traced.len();
    let kept: Vec<Contour> = traced
        .into_iter()
        .map(|c| Contour::from_pixels(c.points.iter().map(|p| (p.x, p.y))))
        .filter(|contour| accept(contour, prepared.edges.as_ref(), frame_area, cfg))
        .collect();

    trace_event!("contours", traced = traced_count, kept = kept.len());
    kept
}

fn accept(
    contour: &Contour,
    edges: Option<&GrayImage>,
    frame_area: f64,
    cfg: &ProcessorConfig,
) -> bool {
    if contour.is_empty() || contour.len() < cfg.min_contour_length {
        return false;
    }
    if cfg.filter_contours_by_size {
        let area = contour.area();
        if area < cfg.min_contour_area || area > cfg.max_area_fraction * frame_area {
            return false;
        }
        if area / contour.len() as f64 <= cfg.min_form_factor {
            return false;
        }
    }
    if let Some(edges) = edges {
        let points = contour.points();
        if !on_edge(edges, points[0]) && !on_edge(edges, points[points.len() / 2]) {
            return false;
        }
    }
    true
}

fn on_edge(edges: &GrayImage, p: Point2) -> bool {
    if p.x < 0.0 || p.y < 0.0 {
        return false;
    }
    edges
        .get_pixel_checked(p.x as u32, p.y as u32)
        .is_some_and(|v| v[0] > 0)
}

#[cfg(test)]
mod tests {
    use super::extract_contours;
    use crate::process::preprocess::Prepared;
    use crate::process::ProcessorConfig;
    use image::{GrayImage, Luma};

    fn filled(width: u32, height: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    fn prepared(binary: GrayImage) -> Prepared {
        Prepared {
            binary,
            edges: None,
        }
    }

    #[test]
    fn keeps_a_plain_blob() {
        let cfg = ProcessorConfig::default();
        let contours = extract_contours(&prepared(filled(100, 100, 20, 20, 30)), &cfg);
        assert_eq!(contours.len(), 1);
        assert!((contours[0].area() - 29.0 * 29.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_blobs_covering_most_of_the_frame() {
        let cfg = ProcessorConfig::default();
        let contours = extract_contours(&prepared(filled(40, 40, 2, 2, 36)), &cfg);
        assert!(contours.is_empty());

        let cfg = ProcessorConfig {
            filter_contours_by_size: false,
            ..ProcessorConfig::default()
        };
        assert_eq!(extract_contours(&prepared(filled(40, 40, 2, 2, 36)), &cfg).len(), 1);
    }

    #[test]
    fn noise_filter_requires_edge_contact() {
        let binary = filled(100, 100, 20, 20, 30);
        let cfg = ProcessorConfig::default();
        let no_edges = Prepared {
            binary: binary.clone(),
            edges: Some(GrayImage::new(100, 100)),
        };
        assert!(extract_contours(&no_edges, &cfg).is_empty());

        let with_edges = Prepared {
            binary: binary.clone(),
            edges: Some(binary),
        };
        assert_eq!(extract_contours(&with_edges, &cfg).len(), 1);
    }
}

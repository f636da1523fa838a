//! Invariance of descriptors under similarity transforms of random polygons.

use contourmatch::{extract, Contour, Point2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const SAMPLES: usize = 30;

/// Star-shaped polygon with 6 to 10 vertices; always simple.
fn random_polygon(rng: &mut StdRng) -> Contour {
    let count = rng.random_range(6..=10usize);
    let points = (0..count)
        .map(|i| {
            let jitter = rng.random_range(-0.3..0.3);
            let theta = 2.0 * PI * (i as f64 + jitter) / count as f64;
            let radius = rng.random_range(30.0..60.0);
            Point2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect();
    Contour::new(points)
}

#[test]
fn identical_contours_give_identical_descriptors() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let polygon = random_polygon(&mut rng);
        let a = extract(&polygon, SAMPLES).unwrap();
        let b = extract(&polygon.clone(), SAMPLES).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn rotation_scale_translation_preserve_acf_and_recover_pose() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let polygon = random_polygon(&mut rng);
        let angle = rng.random_range(-0.7..0.7);
        let scale = rng.random_range(0.5..3.0);
        let offset = Point2::new(rng.random_range(-200.0..200.0), rng.random_range(-200.0..200.0));
        let moved = polygon.transform(angle, scale, offset);

        let reference = extract(&polygon, SAMPLES).unwrap();
        let query = extract(&moved, SAMPLES).unwrap();
        assert!(reference.acf_similarity(&query) > 1.0 - 1e-9);
        assert!(reference.acf_deviation(&query) <= 1);
        assert!((query.norm() / reference.norm() - scale).abs() < 1e-9);

        let corr = reference.inter_correlation(&query, PI / 4.0).unwrap();
        assert!(corr.rate > 1.0 - 1e-9);
        assert!((corr.angle - angle).abs() < 1e-6, "{} vs {}", corr.angle, angle);
    }
}

#[test]
fn start_point_and_direction_barely_change_acf() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..50 {
        let polygon = random_polygon(&mut rng);
        let start = rng.random_range(1..polygon.len());
        let shifted = polygon.rotate_start(start);
        let mut reversed_points = polygon.points().to_vec();
        reversed_points.reverse();
        let reversed = Contour::new(reversed_points);

        let reference = extract(&polygon, SAMPLES).unwrap();
        for other in [shifted, reversed] {
            let d = extract(&other, SAMPLES).unwrap();
            assert!(reference.acf_similarity(&d) > 0.999);
            assert!(reference.acf_deviation(&d) <= 4);
        }
    }
}

#[test]
fn acf_is_normalized() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        let d = extract(&random_polygon(&mut rng), SAMPLES).unwrap();
        assert_eq!(d.acf().len(), SAMPLES / 2);
        assert!((d.acf()[0].norm() - 1.0).abs() < 1e-12);
        assert!(d.acf().iter().all(|c| c.norm() <= 1.0 + 1e-12));
        let energy: f64 = d.edges().iter().map(|e| e.norm_sqr()).sum();
        assert!((energy - 1.0).abs() < 1e-12);
    }
}

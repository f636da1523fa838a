//! Polygon and contour primitives.
//!
//! Coordinates follow the image convention: x grows to the right and y grows
//! downward. A contour is an implicitly closed polyline; the last point
//! connects back to the first.

/// A 2D point with sub-pixel precision.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (downward).
    pub y: f64,
}

impl Point2 {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn lerp(self, other: Point2, t: f64) -> Point2 {
        Point2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Axis-aligned bounding box with inclusive float bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Returns the box width.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the box height.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the box area.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the box center.
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Grows the box by `margin` on every side.
    pub fn inflate(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }
}

/// Ordered, closed sequence of points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    points: Vec<Point2>,
}

impl Contour {
    /// Creates a contour from ordered points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Creates a contour from integer pixel coordinates.
    pub fn from_pixels<I>(pixels: I) -> Self
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let points = pixels
            .into_iter()
            .map(|(x, y)| Point2::new(f64::from(x), f64::from(y)))
            .collect();
        Self { points }
    }

    /// Returns the points in traversal order.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Returns the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the contour has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over closed edges `(p[i], p[i + 1])`, wrapping at the end.
    fn edges(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Closed arc length.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    /// Shoelace area in image coordinates.
    ///
    /// Positive for clockwise traversal as seen on screen (y down).
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        let twice: f64 = self.edges().map(|(a, b)| a.x * b.y - b.x * a.y).sum();
        twice * 0.5
    }

    /// Enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Bounding box, or `None` for an empty contour.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &self.points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        Some(bbox)
    }

    /// Area centroid; falls back to the vertex mean for zero-area contours.
    pub fn centroid(&self) -> Option<Point2> {
        if self.points.is_empty() {
            return None;
        }
        let area = self.signed_area();
        if area.abs() > f64::EPSILON {
            let mut cx = 0.0;
            let mut cy = 0.0;
            for (a, b) in self.edges() {
                let cross = a.x * b.y - b.x * a.y;
                cx += (a.x + b.x) * cross;
                cy += (a.y + b.y) * cross;
            }
            let k = 1.0 / (6.0 * area);
            return Some(Point2::new(cx * k, cy * k));
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2::new(sx / n, sy / n))
    }

    /// Number of pairwise distinct points.
    pub fn distinct_points(&self) -> usize {
        let mut keys: Vec<(u64, u64)> = self
            .points
            .iter()
            .map(|p| (p.x.to_bits(), p.y.to_bits()))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// Returns the contour traversed counter-clockwise on screen.
    ///
    /// The start point is preserved.
    pub fn counter_clockwise(&self) -> Contour {
        if self.signed_area() <= 0.0 {
            return self.clone();
        }
        let mut points = Vec::with_capacity(self.points.len());
        if let Some((first, rest)) = self.points.split_first() {
            points.push(*first);
            points.extend(rest.iter().rev().copied());
        }
        Contour { points }
    }

    /// Resamples the contour to `count` points equally spaced by arc length,
    /// starting at the first point.
    ///
    /// Returns an empty vector when the contour has zero length.
    pub fn resample(&self, count: usize) -> Vec<Point2> {
        let n = self.points.len();
        let perimeter = self.perimeter();
        if count == 0 || n < 2 || perimeter <= 0.0 {
            return Vec::new();
        }

        let step = perimeter / count as f64;
        let mut out = Vec::with_capacity(count);
        let mut seg = 0usize;
        let mut acc = 0.0;
        let mut seg_len = self.points[0].distance(self.points[1 % n]);
        for k in 0..count {
            let target = k as f64 * step;
            while seg + 1 < n && acc + seg_len < target {
                acc += seg_len;
                seg += 1;
                seg_len = self.points[seg].distance(self.points[(seg + 1) % n]);
            }
            let a = self.points[seg];
            let b = self.points[(seg + 1) % n];
            let t = if seg_len > 0.0 {
                ((target - acc) / seg_len).clamp(0.0, 1.0)
            } else {
                0.0
            };
            out.push(a.lerp(b, t));
        }
        out
    }

    /// Rotates by `angle` radians (counter-clockwise on screen) and scales by
    /// `scale` about the origin, then translates by `offset`.
    pub fn transform(&self, angle: f64, scale: f64, offset: Point2) -> Contour {
        let (sin_a, cos_a) = angle.sin_cos();
        let points = self
            .points
            .iter()
            .map(|p| {
                Point2::new(
                    scale * (p.x * cos_a + p.y * sin_a) + offset.x,
                    scale * (-p.x * sin_a + p.y * cos_a) + offset.y,
                )
            })
            .collect();
        Contour { points }
    }

    /// Returns the same closed polygon starting at point `start`.
    pub fn rotate_start(&self, start: usize) -> Contour {
        if self.points.is_empty() {
            return self.clone();
        }
        let mut points = self.points.clone();
        points.rotate_left(start % self.points.len());
        Contour { points }
    }
}

impl From<Vec<Point2>> for Contour {
    fn from(points: Vec<Point2>) -> Self {
        Self::new(points)
    }
}

//! Closed polygon type.
//!
//! A polygon is an ordered point sequence; the last point implicitly
//! connects back to the first. The sign of the signed area is the sole
//! solid-vs-hole classification: counter-clockwise (positive) contours are
//! solid boundaries, clockwise (negative) contours are holes. There is no
//! explicit parent/child nesting.

use super::{BoundingBox2, Line, Point2};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// A closed 2D polygon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point2>,
}

impl Polygon {
    /// Create a polygon from a point sequence.
    pub fn from_points(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// The vertex sequence.
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A polygon needs at least three vertices to enclose area.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3
    }

    /// Signed area via the shoelace formula. Positive for counter-clockwise.
    pub fn signed_area(&self) -> CoordF {
        if !self.is_valid() {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            sum += a.cross(&b);
        }
        sum * 0.5
    }

    /// Unsigned enclosed area.
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    /// True when the winding is counter-clockwise (a solid boundary).
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() >= 0.0
    }

    /// True when the winding is clockwise (a hole).
    pub fn is_hole(&self) -> bool {
        self.signed_area() < 0.0
    }

    /// Reverse the winding in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Total edge length.
    pub fn perimeter(&self) -> CoordF {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.points.len() {
            let a = self.points[i];
            let b = self.points[(i + 1) % self.points.len()];
            total += a.distance_to(&b);
        }
        total
    }

    /// Iterate the closing edges, including last-to-first.
    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Bounding box of the vertex set.
    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(&self.points)
    }

    /// Even-odd point containment test (boundary points count as inside
    /// or outside depending on edge direction; callers needing exact
    /// boundary semantics should test with a tolerance).
    pub fn contains(&self, p: &Point2) -> bool {
        if !self.is_valid() {
            return false;
        }
        let mut inside = false;
        let n = self.points.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Translate every vertex in place.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF) {
        for p in &mut self.points {
            p.translate(dx, dy);
        }
    }

    /// Scale every vertex in place.
    pub fn scale(&mut self, factor: CoordF) {
        for p in &mut self.points {
            p.scale(factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
    }

    #[test]
    fn signed_area_ccw_positive() {
        let sq = square(2.0);
        assert!((sq.signed_area() - 4.0).abs() < 1e-12);
        assert!(sq.is_counter_clockwise());

        let mut rev = sq.clone();
        rev.reverse();
        assert!((rev.signed_area() + 4.0).abs() < 1e-12);
        assert!(rev.is_hole());
    }

    #[test]
    fn degenerate_polygon_has_zero_area() {
        let p = Polygon::from_points(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]);
        assert!(!p.is_valid());
        assert_eq!(p.signed_area(), 0.0);
    }

    #[test]
    fn contains_center_not_outside() {
        let sq = square(4.0);
        assert!(sq.contains(&Point2::new(2.0, 2.0)));
        assert!(!sq.contains(&Point2::new(5.0, 2.0)));
        assert!(!sq.contains(&Point2::new(-0.1, 2.0)));
    }

    #[test]
    fn perimeter_of_square() {
        assert!((square(3.0).perimeter() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn edges_close_the_loop() {
        let sq = square(1.0);
        let edges: Vec<_> = sq.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3].b, sq.points()[0]);
    }
}

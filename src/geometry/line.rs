//! Line segment type and segment/segment intersection.

use super::Point2;
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A line segment defined by two endpoints.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: Point2,
    pub b: Point2,
}

impl Line {
    /// Create a new line segment from two points.
    #[inline]
    pub const fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    /// Direction vector (b - a).
    #[inline]
    pub fn direction(&self) -> Point2 {
        self.b - self.a
    }

    /// Segment length.
    pub fn length(&self) -> CoordF {
        self.a.distance_to(&self.b)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point2 {
        Point2::new((self.a.x + self.b.x) * 0.5, (self.a.y + self.b.y) * 0.5)
    }

    /// True when both endpoints coincide.
    pub fn is_point(&self) -> bool {
        self.a == self.b
    }

    /// Point at parameter `t` along the segment (t=0 -> a, t=1 -> b).
    #[must_use]
    pub fn point_at(&self, t: CoordF) -> Point2 {
        self.a + self.direction() * t
    }

    /// Intersection with another segment.
    ///
    /// Returns the intersection point when the segments properly cross
    /// (both parameters within [0, 1]). Parallel and collinear segments
    /// yield `None`.
    pub fn intersection(&self, other: &Line) -> Option<Point2> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denom = d1.cross(&d2);
        if denom == 0.0 {
            return None;
        }
        let delta = other.a - self.a;
        let t = delta.cross(&d2) / denom;
        let u = delta.cross(&d1) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.point_at(t))
        } else {
            None
        }
    }

    /// Intersection treating `self` as an infinite line but `other` as a
    /// bounded segment. Used when sweeping infill lines across contours.
    pub fn intersection_with_segment(&self, other: &Line) -> Option<Point2> {
        let d1 = self.direction();
        let d2 = other.direction();
        let denom = d1.cross(&d2);
        if denom == 0.0 {
            return None;
        }
        let delta = other.a - self.a;
        let u = delta.cross(&d1) / denom;
        if (0.0..=1.0).contains(&u) {
            Some(other.point_at(u))
        } else {
            None
        }
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments_intersect() {
        let a = Line::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0));
        let b = Line::new(Point2::new(0.0, 2.0), Point2::new(2.0, 0.0));
        let p = a.intersection(&b).unwrap();
        assert!(p.approx_eq(&Point2::new(1.0, 1.0), 1e-12));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let a = Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let b = Line::new(Point2::new(0.0, 1.0), Point2::new(1.0, 1.0));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let a = Line::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Line::new(Point2::new(3.0, 0.0), Point2::new(4.0, -1.0));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn infinite_line_hits_segment_beyond_endpoints() {
        // The carrier line of `a` extends past x=1 and crosses `b`.
        let a = Line::new(Point2::new(0.0, 1.0), Point2::new(1.0, 1.0));
        let b = Line::new(Point2::new(5.0, 0.0), Point2::new(5.0, 2.0));
        assert!(a.intersection(&b).is_none());
        let p = a.intersection_with_segment(&b).unwrap();
        assert!(p.approx_eq(&Point2::new(5.0, 1.0), 1e-12));
    }
}

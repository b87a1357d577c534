//! Axis-aligned bounding boxes.
//!
//! Boxes start undefined and become defined on the first merge. Merging is
//! monotonic: a defined box only ever grows. The 2D and 3D variants carry
//! dimension-specific methods instead of a duck-typed common merge.

use super::{Point2, Point3};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
    pub defined: bool,
}

/// 3D axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
    pub defined: bool,
}

impl BoundingBox2 {
    /// Create an empty (undefined) box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a box spanning a point set. Empty input yields an undefined box.
    pub fn from_points(points: &[Point2]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Merge a single point into the box.
    pub fn merge_point(&mut self, p: Point2) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Merge another box into this one. Merging an undefined box is a no-op.
    pub fn merge(&mut self, other: &BoundingBox2) {
        if !other.defined {
            return;
        }
        self.merge_point(other.min);
        self.merge_point(other.max);
    }

    /// Grow the box outward by `amount` on every side.
    pub fn grow(&mut self, amount: CoordF) {
        if self.defined {
            self.min.translate(-amount, -amount);
            self.max.translate(amount, amount);
        }
    }

    /// Width along X. Zero while undefined.
    pub fn width(&self) -> CoordF {
        if self.defined {
            self.max.x - self.min.x
        } else {
            0.0
        }
    }

    /// Height along Y. Zero while undefined.
    pub fn height(&self) -> CoordF {
        if self.defined {
            self.max.y - self.min.y
        } else {
            0.0
        }
    }

    /// Center point.
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Half the diagonal length, i.e. the radius of the enclosing circle.
    pub fn radius(&self) -> CoordF {
        0.5 * (self.max - self.min).length()
    }

    /// The four corners, counter-clockwise from min.
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }

    /// Check whether a point lies inside or on the boundary.
    pub fn contains(&self, p: &Point2) -> bool {
        self.defined
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }
}

impl BoundingBox3 {
    /// Create an empty (undefined) box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a box spanning a point set. Empty input yields an undefined box.
    pub fn from_points(points: &[Point3]) -> Self {
        let mut bb = Self::new();
        for p in points {
            bb.merge_point(*p);
        }
        bb
    }

    /// Merge a single point into the box.
    pub fn merge_point(&mut self, p: Point3) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.min.z = self.min.z.min(p.z);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
            self.max.z = self.max.z.max(p.z);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Merge another box into this one. Merging an undefined box is a no-op.
    pub fn merge(&mut self, other: &BoundingBox3) {
        if !other.defined {
            return;
        }
        self.merge_point(other.min);
        self.merge_point(other.max);
    }

    /// Grow the box outward by `amount` on every side.
    pub fn grow(&mut self, amount: CoordF) {
        if self.defined {
            self.min.translate(-amount, -amount, -amount);
            self.max.translate(amount, amount, amount);
        }
    }

    /// Size along each axis.
    pub fn size(&self) -> Point3 {
        if self.defined {
            self.max - self.min
        } else {
            Point3::default()
        }
    }

    /// Center point.
    pub fn center(&self) -> Point3 {
        (self.min + self.max).scaled(0.5)
    }

    /// Project onto the XY plane.
    pub fn to_2d(&self) -> BoundingBox2 {
        BoundingBox2 {
            min: self.min.to_2d(),
            max: self.max.to_2d(),
            defined: self.defined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_undefined() {
        let bb = BoundingBox2::new();
        assert!(!bb.defined);
        assert_eq!(bb.width(), 0.0);
    }

    #[test]
    fn merge_is_commutative() {
        let a = BoundingBox2::from_points(&[Point2::new(0.0, 0.0), Point2::new(2.0, 1.0)]);
        let b = BoundingBox2::from_points(&[Point2::new(-1.0, 3.0), Point2::new(1.0, -2.0)]);

        let mut ab = a;
        ab.merge(&b);
        let mut ba = b;
        ba.merge(&a);

        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_monotonic() {
        let mut bb = BoundingBox2::from_points(&[Point2::new(0.0, 0.0), Point2::new(4.0, 4.0)]);
        let before = bb;
        // Merging an interior point must not shrink the box.
        bb.merge_point(Point2::new(2.0, 2.0));
        assert_eq!(bb, before);

        bb.merge_point(Point2::new(5.0, -1.0));
        assert!(bb.max.x >= before.max.x && bb.min.y <= before.min.y);
    }

    #[test]
    fn merge_undefined_is_noop() {
        let mut bb = BoundingBox2::from_points(&[Point2::new(1.0, 1.0)]);
        let before = bb;
        bb.merge(&BoundingBox2::new());
        assert_eq!(bb, before);
    }

    #[test]
    fn invariant_min_leq_max() {
        let bb = BoundingBox3::from_points(&[
            Point3::new(3.0, -1.0, 2.0),
            Point3::new(-3.0, 1.0, -2.0),
        ]);
        assert!(bb.min.x <= bb.max.x && bb.min.y <= bb.max.y && bb.min.z <= bb.max.z);
    }

    #[test]
    fn grow_expands_both_sides() {
        let mut bb = BoundingBox2::from_points(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]);
        bb.grow(0.5);
        assert_eq!(bb.min, Point2::new(-0.5, -0.5));
        assert_eq!(bb.max, Point2::new(1.5, 1.5));
    }
}

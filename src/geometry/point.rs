//! 2D and 3D point types.
//!
//! Points double as absolute positions and free vectors. Every transforming
//! operation comes in an in-place variant (`scale`, `translate`, `rotate`)
//! and a non-mutating variant (`scaled`, `translated`, `rotated`).

use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point with floating-point coordinates (model space, mm).
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: CoordF,
    pub y: CoordF,
}

/// A 3D point with floating-point coordinates (model space, mm).
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

impl Point2 {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    /// Scale both coordinates by `factor` in place.
    pub fn scale(&mut self, factor: CoordF) {
        self.x *= factor;
        self.y *= factor;
    }

    /// Return a scaled copy.
    #[must_use]
    pub fn scaled(&self, factor: CoordF) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Translate in place.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF) {
        self.x += dx;
        self.y += dy;
    }

    /// Return a translated copy.
    #[must_use]
    pub fn translated(&self, dx: CoordF, dy: CoordF) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rotate around `center` (or the origin if `None`) in place.
    pub fn rotate(&mut self, angle_rad: CoordF, center: Option<Point2>) {
        *self = self.rotated(angle_rad, center);
    }

    /// Return a copy rotated around `center` (or the origin if `None`).
    #[must_use]
    pub fn rotated(&self, angle_rad: CoordF, center: Option<Point2>) -> Self {
        let (s, c) = angle_rad.sin_cos();
        let ctr = center.unwrap_or_default();
        let dx = self.x - ctr.x;
        let dy = self.y - ctr.y;
        Self::new(ctr.x + dx * c - dy * s, ctr.y + dx * s + dy * c)
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2) -> CoordF {
        (*other - *self).length()
    }

    /// Vector length when interpreted as a free vector.
    pub fn length(&self) -> CoordF {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(&self, other: &Point2) -> CoordF {
        self.x * other.x + self.y * other.y
    }

    /// Scalar cross product with another vector.
    #[inline]
    pub fn cross(&self, other: &Point2) -> CoordF {
        self.x * other.y - self.y * other.x
    }

    /// Normalized copy; the zero vector is returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            *self
        } else {
            self.scaled(1.0 / len)
        }
    }

    /// Check approximate equality within `epsilon` per axis.
    pub fn approx_eq(&self, other: &Point2, epsilon: CoordF) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Point3 {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF, z: CoordF) -> Self {
        Self { x, y, z }
    }

    /// Drop the Z coordinate.
    #[inline]
    pub fn to_2d(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Scale all coordinates by `factor` in place.
    pub fn scale(&mut self, factor: CoordF) {
        self.x *= factor;
        self.y *= factor;
        self.z *= factor;
    }

    /// Return a scaled copy.
    #[must_use]
    pub fn scaled(&self, factor: CoordF) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Translate in place.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Return a translated copy.
    #[must_use]
    pub fn translated(&self, dx: CoordF, dy: CoordF, dz: CoordF) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Rotate around the Z axis through `center` (origin if `None`) in place.
    pub fn rotate_z(&mut self, angle_rad: CoordF, center: Option<Point2>) {
        let xy = self.to_2d().rotated(angle_rad, center);
        self.x = xy.x;
        self.y = xy.y;
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point3) -> CoordF {
        (*other - *self).length()
    }

    /// Vector length when interpreted as a free vector.
    pub fn length(&self) -> CoordF {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Dot product with another vector.
    #[inline]
    pub fn dot(&self, other: &Point3) -> CoordF {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product with another vector.
    #[must_use]
    pub fn cross(&self, other: &Point3) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Normalized copy; the zero vector is returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            *self
        } else {
            self.scaled(1.0 / len)
        }
    }
}

impl Add for Point2 {
    type Output = Point2;
    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;
    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Point2 {
    fn add_assign(&mut self, rhs: Point2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Point2 {
    fn sub_assign(&mut self, rhs: Point2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<CoordF> for Point2 {
    type Output = Point2;
    fn mul(self, rhs: CoordF) -> Point2 {
        self.scaled(rhs)
    }
}

impl Neg for Point2 {
    type Output = Point2;
    fn neg(self) -> Point2 {
        Point2::new(-self.x, -self.y)
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<CoordF> for Point3 {
    type Output = Point3;
    fn mul(self, rhs: CoordF) -> Point3 {
        self.scaled(rhs)
    }
}

impl Neg for Point3 {
    type Output = Point3;
    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Debug for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn scaled_does_not_mutate() {
        let p = Point2::new(2.0, 3.0);
        let q = p.scaled(2.0);
        assert_eq!(p, Point2::new(2.0, 3.0));
        assert_eq!(q, Point2::new(4.0, 6.0));
    }

    #[test]
    fn rotate_around_center() {
        let mut p = Point2::new(2.0, 1.0);
        p.rotate(std::f64::consts::FRAC_PI_2, Some(Point2::new(1.0, 1.0)));
        assert!(p.approx_eq(&Point2::new(1.0, 2.0), EPS));
    }

    #[test]
    fn rotate_around_origin() {
        let p = Point2::new(1.0, 0.0).rotated(std::f64::consts::PI, None);
        assert!(p.approx_eq(&Point2::new(-1.0, 0.0), EPS));
    }

    #[test]
    fn cross_sign() {
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        assert!(a.cross(&b) > 0.0);
        assert!(b.cross(&a) < 0.0);
    }

    #[test]
    fn point3_cross() {
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = x.cross(&y);
        assert!((z.z - 1.0).abs() < EPS);
    }
}

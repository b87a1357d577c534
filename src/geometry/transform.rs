//! 3x4 affine transformation matrix.
//!
//! A 3x3 linear part plus a translation column. Composition order is made
//! explicit: [`TransformationMatrix::apply_left`] pre-multiplies (the new
//! transform happens after this one in world space), [`apply_right`]
//! post-multiplies.

use super::Point3;
use crate::{CoordF, Error, Result};
use serde::{Deserialize, Serialize};

/// Coordinate axis selector for rotations and mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A 3x4 affine transformation matrix (row-major).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformationMatrix {
    pub m00: CoordF,
    pub m01: CoordF,
    pub m02: CoordF,
    pub m03: CoordF,
    pub m10: CoordF,
    pub m11: CoordF,
    pub m12: CoordF,
    pub m13: CoordF,
    pub m20: CoordF,
    pub m21: CoordF,
    pub m22: CoordF,
    pub m23: CoordF,
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl TransformationMatrix {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            m00: 1.0,
            m01: 0.0,
            m02: 0.0,
            m03: 0.0,
            m10: 0.0,
            m11: 1.0,
            m12: 0.0,
            m13: 0.0,
            m20: 0.0,
            m21: 0.0,
            m22: 1.0,
            m23: 0.0,
        }
    }

    /// A pure translation.
    pub fn translation(x: CoordF, y: CoordF, z: CoordF) -> Self {
        let mut m = Self::identity();
        m.m03 = x;
        m.m13 = y;
        m.m23 = z;
        m
    }

    /// A per-axis scaling.
    pub fn scaling(x: CoordF, y: CoordF, z: CoordF) -> Self {
        let mut m = Self::identity();
        m.m00 = x;
        m.m11 = y;
        m.m22 = z;
        m
    }

    /// A rotation of `angle_rad` around the given axis.
    pub fn rotation(angle_rad: CoordF, axis: Axis) -> Self {
        let (s, c) = angle_rad.sin_cos();
        let mut m = Self::identity();
        match axis {
            Axis::X => {
                m.m11 = c;
                m.m12 = -s;
                m.m21 = s;
                m.m22 = c;
            }
            Axis::Y => {
                m.m00 = c;
                m.m02 = s;
                m.m20 = -s;
                m.m22 = c;
            }
            Axis::Z => {
                m.m00 = c;
                m.m01 = -s;
                m.m10 = s;
                m.m11 = c;
            }
        }
        m
    }

    /// A rotation from a (not necessarily normalized) quaternion.
    pub fn rotation_quaternion(q1: CoordF, q2: CoordF, q3: CoordF, q4: CoordF) -> Self {
        let mut q = [q1, q2, q3, q4];
        let norm2 = q.iter().map(|v| v * v).sum::<CoordF>();
        if (norm2 - 1.0).abs() > 1e-12 {
            let f = 1.0 / norm2.sqrt();
            for v in &mut q {
                *v *= f;
            }
        }
        let [w, x, y, z] = q;
        Self {
            m00: 1.0 - 2.0 * (y * y + z * z),
            m01: 2.0 * (x * y - w * z),
            m02: 2.0 * (x * z + w * y),
            m03: 0.0,
            m10: 2.0 * (x * y + w * z),
            m11: 1.0 - 2.0 * (x * x + z * z),
            m12: 2.0 * (y * z - w * x),
            m13: 0.0,
            m20: 2.0 * (x * z - w * y),
            m21: 2.0 * (y * z + w * x),
            m22: 1.0 - 2.0 * (x * x + y * y),
            m23: 0.0,
        }
    }

    /// A mirror across the plane perpendicular to the given axis.
    pub fn mirror(axis: Axis) -> Self {
        let mut m = Self::identity();
        match axis {
            Axis::X => m.m00 = -1.0,
            Axis::Y => m.m11 = -1.0,
            Axis::Z => m.m22 = -1.0,
        }
        m
    }

    /// Determinant of the 3x3 linear part.
    pub fn determinant(&self) -> CoordF {
        self.m00 * (self.m11 * self.m22 - self.m12 * self.m21)
            - self.m01 * (self.m10 * self.m22 - self.m12 * self.m20)
            + self.m02 * (self.m10 * self.m21 - self.m11 * self.m20)
    }

    /// Inverse transform. Fails when the linear part is singular.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        if det == 0.0 {
            return Err(Error::Encoding(
                "transformation matrix is not invertible (zero determinant)".into(),
            ));
        }
        let inv_det = 1.0 / det;

        let mut inv = Self {
            m00: (self.m11 * self.m22 - self.m12 * self.m21) * inv_det,
            m01: (self.m02 * self.m21 - self.m01 * self.m22) * inv_det,
            m02: (self.m01 * self.m12 - self.m02 * self.m11) * inv_det,
            m03: 0.0,
            m10: (self.m12 * self.m20 - self.m10 * self.m22) * inv_det,
            m11: (self.m00 * self.m22 - self.m02 * self.m20) * inv_det,
            m12: (self.m02 * self.m10 - self.m00 * self.m12) * inv_det,
            m13: 0.0,
            m20: (self.m10 * self.m21 - self.m11 * self.m20) * inv_det,
            m21: (self.m01 * self.m20 - self.m00 * self.m21) * inv_det,
            m22: (self.m00 * self.m11 - self.m01 * self.m10) * inv_det,
            m23: 0.0,
        };

        // inv(T) = -inv(L) * t for the translation column.
        let t = Point3::new(self.m03, self.m13, self.m23);
        let it = inv.transform_vector(&-t);
        inv.m03 = it.x;
        inv.m13 = it.y;
        inv.m23 = it.z;
        Ok(inv)
    }

    /// Matrix product `left * right`.
    #[must_use]
    pub fn multiply(left: &Self, right: &Self) -> Self {
        Self {
            m00: left.m00 * right.m00 + left.m01 * right.m10 + left.m02 * right.m20,
            m01: left.m00 * right.m01 + left.m01 * right.m11 + left.m02 * right.m21,
            m02: left.m00 * right.m02 + left.m01 * right.m12 + left.m02 * right.m22,
            m03: left.m00 * right.m03 + left.m01 * right.m13 + left.m02 * right.m23 + left.m03,
            m10: left.m10 * right.m00 + left.m11 * right.m10 + left.m12 * right.m20,
            m11: left.m10 * right.m01 + left.m11 * right.m11 + left.m12 * right.m21,
            m12: left.m10 * right.m02 + left.m11 * right.m12 + left.m12 * right.m22,
            m13: left.m10 * right.m03 + left.m11 * right.m13 + left.m12 * right.m23 + left.m13,
            m20: left.m20 * right.m00 + left.m21 * right.m10 + left.m22 * right.m20,
            m21: left.m20 * right.m01 + left.m21 * right.m11 + left.m22 * right.m21,
            m22: left.m20 * right.m02 + left.m21 * right.m12 + left.m22 * right.m22,
            m23: left.m20 * right.m03 + left.m21 * right.m13 + left.m22 * right.m23 + left.m23,
        }
    }

    /// Pre-multiply: `self = left * self`.
    pub fn apply_left(&mut self, left: &Self) {
        *self = Self::multiply(left, self);
    }

    /// Post-multiply: `self = self * right`.
    pub fn apply_right(&mut self, right: &Self) {
        *self = Self::multiply(self, right);
    }

    /// Transform a position (translation applies).
    #[must_use]
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        self.transform(p, 1.0)
    }

    /// Transform a free vector (translation ignored).
    #[must_use]
    pub fn transform_vector(&self, v: &Point3) -> Point3 {
        self.transform(v, 0.0)
    }

    fn transform(&self, p: &Point3, w: CoordF) -> Point3 {
        Point3::new(
            p.x * self.m00 + p.y * self.m01 + p.z * self.m02 + self.m03 * w,
            p.x * self.m10 + p.y * self.m11 + p.z * self.m12 + self.m13 * w,
            p.x * self.m20 + p.y * self.m21 + p.z * self.m22 + self.m23 * w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: &Point3, b: &Point3) -> bool {
        (*a - *b).length() < EPS
    }

    #[test]
    fn translation_roundtrip_through_inverse() {
        let m = TransformationMatrix::translation(3.0, -2.0, 7.5);
        let inv = m.inverse().unwrap();
        let p = Point3::new(1.0, 2.0, 3.0);
        let back = inv.transform_point(&m.transform_point(&p));
        assert!(close(&back, &p));
    }

    #[test]
    fn rotation_then_inverse() {
        let m = TransformationMatrix::rotation(0.7, Axis::Z);
        let inv = m.inverse().unwrap();
        let p = Point3::new(4.0, -1.0, 2.0);
        assert!(close(&inv.transform_point(&m.transform_point(&p)), &p));
    }

    #[test]
    fn singular_matrix_fails_to_invert() {
        let m = TransformationMatrix::scaling(1.0, 0.0, 1.0);
        assert!(m.inverse().is_err());
    }

    #[test]
    fn apply_left_vs_apply_right() {
        let t = TransformationMatrix::translation(1.0, 0.0, 0.0);
        let r = TransformationMatrix::rotation(std::f64::consts::FRAC_PI_2, Axis::Z);
        let p = Point3::new(1.0, 0.0, 0.0);

        // Rotate after translating: left-apply the rotation.
        let mut m = t;
        m.apply_left(&r);
        assert!(close(&m.transform_point(&p), &Point3::new(0.0, 2.0, 0.0)));

        // Rotate before translating: right-apply the rotation.
        let mut m = t;
        m.apply_right(&r);
        assert!(close(&m.transform_point(&p), &Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn quaternion_identity() {
        let m = TransformationMatrix::rotation_quaternion(1.0, 0.0, 0.0, 0.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(close(&m.transform_point(&p), &p));
    }

    #[test]
    fn mirror_flips_one_axis() {
        let m = TransformationMatrix::mirror(Axis::X);
        let p = m.transform_point(&Point3::new(2.0, 3.0, 4.0));
        assert!(close(&p, &Point3::new(-2.0, 3.0, 4.0)));
    }
}

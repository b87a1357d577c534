//! Geometry primitives for the slicing pipeline.
//!
//! This module provides the fundamental geometric types used throughout:
//! - [`Point2`] and [`Point3`] - floating-point points in model space (mm)
//! - [`Line`] - line segment between two 2D points
//! - [`Polygon`] - closed contour whose winding sign encodes solid vs. hole
//! - [`BoundingBox2`] and [`BoundingBox3`] - axis-aligned bounding boxes
//!   with an explicit `defined` flag
//! - [`TransformationMatrix`] - 3x4 affine transform with explicit
//!   left/right composition

mod bounding_box;
mod line;
mod point;
mod polygon;
mod transform;

pub use bounding_box::{BoundingBox2, BoundingBox3};
pub use line::Line;
pub use point::{Point2, Point3};
pub use polygon::Polygon;
pub use transform::{Axis, TransformationMatrix};

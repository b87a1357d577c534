//! A single layer of the print.

use crate::geometry::{BoundingBox2, Polygon};
use crate::CoordF;

/// One horizontal cross-section of the model.
///
/// Produced by the [`Slicer`](super::Slicer) and immutable afterwards: the
/// infill and raster stages read layers, they never modify them.
#[derive(Clone, Debug, Default)]
pub struct SliceLayer {
    /// Zero-based layer index.
    pub index: usize,
    /// Z height this layer was cut at (mm).
    pub height: CoordF,
    /// Closed contours; counter-clockwise = solid, clockwise = hole.
    pub polygons: Vec<Polygon>,
}

impl SliceLayer {
    pub fn new(index: usize, height: CoordF, polygons: Vec<Polygon>) -> Self {
        Self {
            index,
            height,
            polygons,
        }
    }

    /// A layer with no geometry (the mesh has nothing at this height).
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Bounding box of all contours.
    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bb = BoundingBox2::new();
        for poly in &self.polygons {
            bb.merge(&poly.bounding_box());
        }
        bb
    }

    /// Total solid area: positive contours minus holes.
    pub fn solid_area(&self) -> CoordF {
        self.polygons.iter().map(|p| p.signed_area()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;

    #[test]
    fn solid_area_subtracts_holes() {
        let outer = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        let mut hole = Polygon::from_points(vec![
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(1.0, 2.0),
        ]);
        hole.reverse();
        let layer = SliceLayer::new(0, 0.05, vec![outer, hole]);
        assert!((layer.solid_area() - 15.0).abs() < 1e-12);
    }
}

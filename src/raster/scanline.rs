//! Scalar (CPU) rasterization path.

use super::{paint_plan, to_pixel_space, RasterFrame, Rasterizer};
use crate::geometry::{BoundingBox2, Point2, Polygon};
use crate::CoordF;

/// Classic scanline polygon fill.
///
/// For every contour (painted per [`paint_plan`] order and color), edge
/// crossings with each scanline are collected, sorted, and the even-odd
/// spans between them filled. Sampling happens at pixel centers.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanlineRasterizer;

impl ScanlineRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn fill_polygon(frame: &mut RasterFrame, pixel_points: &[Point2], color: u8) {
        let n = pixel_points.len();
        if n < 3 {
            return;
        }

        let min_y = pixel_points
            .iter()
            .map(|p| p.y)
            .fold(CoordF::INFINITY, CoordF::min);
        let max_y = pixel_points
            .iter()
            .map(|p| p.y)
            .fold(CoordF::NEG_INFINITY, CoordF::max);
        let y_start = min_y.floor().max(0.0) as usize;
        let y_end = (max_y.ceil() as isize).clamp(0, frame.height() as isize) as usize;

        let mut crossings: Vec<CoordF> = Vec::with_capacity(8);
        for y in y_start..y_end {
            let sample_y = y as CoordF + 0.5;
            crossings.clear();

            for i in 0..n {
                let a = pixel_points[i];
                let b = pixel_points[(i + 1) % n];
                // Half-open rule: include the lower endpoint, exclude the
                // upper, so scanlines through a vertex count one crossing.
                if (a.y <= sample_y) != (b.y <= sample_y) {
                    let t = (sample_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + (b.x - a.x) * t);
                }
            }

            crossings.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));
            for pair in crossings.chunks_exact(2) {
                // Pixels whose centers fall inside [x0, x1).
                let x0 = (pair[0] - 0.5).ceil() as isize;
                let x1 = (pair[1] - 0.5).ceil() as isize;
                frame.fill_span(y, x0, x1, color);
            }
        }
    }
}

impl Rasterizer for ScanlineRasterizer {
    fn rasterize(
        &self,
        polygons: &[Polygon],
        original_bounds: &BoundingBox2,
        pixel_width: usize,
        pixel_height: usize,
    ) -> RasterFrame {
        let mut frame = RasterFrame::new(pixel_width, pixel_height);

        for (index, color) in paint_plan(polygons) {
            let pixel_points: Vec<Point2> = polygons[index]
                .points()
                .iter()
                .map(|p| to_pixel_space(p, original_bounds, pixel_width, pixel_height))
                .collect();
            Self::fill_polygon(&mut frame, &pixel_points, color);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{BACKGROUND, FOREGROUND};
    use super::*;

    #[test]
    fn centered_square_lights_center_not_corners() {
        // The unit square centered on the origin, rasterized onto a
        // platform twice its size: center pixel cured, corners dark.
        let square = centered_square(0.5);
        let bounds = centered_bounds(2.0, 2.0);
        let frame = ScanlineRasterizer::new().rasterize(&[square], &bounds, 100, 100);

        assert_eq!(frame.get(50, 50), FOREGROUND);
        assert_eq!(frame.get(0, 0), BACKGROUND);
        assert_eq!(frame.get(99, 99), BACKGROUND);
        assert_eq!(frame.get(99, 0), BACKGROUND);
    }

    #[test]
    fn square_covers_expected_fraction() {
        // Half-extent 0.5 on a 2x2 platform covers a quarter of the area.
        let square = centered_square(0.5);
        let bounds = centered_bounds(2.0, 2.0);
        let frame = ScanlineRasterizer::new().rasterize(&[square], &bounds, 200, 200);
        assert!((frame.coverage() - 0.25).abs() < 0.01);
    }

    #[test]
    fn hole_is_background() {
        let outer = centered_square(0.8);
        let mut hole = centered_square(0.3);
        hole.reverse();
        let bounds = centered_bounds(2.0, 2.0);
        let frame =
            ScanlineRasterizer::new().rasterize(&[outer, hole], &bounds, 100, 100);

        assert_eq!(frame.get(50, 50), BACKGROUND);
        // Ring between hole and outer boundary is cured.
        assert_eq!(frame.get(50, 25), FOREGROUND);
    }

    #[test]
    fn winding_classification_is_order_independent() {
        // Listing the hole before the solid must not change the output.
        let outer = centered_square(0.8);
        let mut hole = centered_square(0.3);
        hole.reverse();
        let bounds = centered_bounds(2.0, 2.0);
        let r = ScanlineRasterizer::new();

        let a = r.rasterize(&[outer.clone(), hole.clone()], &bounds, 64, 64);
        let b = r.rasterize(&[hole, outer], &bounds, 64, 64);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_layer_is_all_background() {
        let bounds = centered_bounds(2.0, 2.0);
        let frame = ScanlineRasterizer::new().rasterize(&[], &bounds, 16, 16);
        assert!(frame.pixels().iter().all(|&p| p == BACKGROUND));
    }
}

//! Batch (triangle) rasterization path.
//!
//! Mirrors the structure of a GPU-backed rasterizer: each contour is ear-
//! clipped into a triangle list, all triangles of a layer are appended to
//! one flat vertex buffer, and the buffer is rasterized in a single pass
//! with half-space coverage tests at pixel centers. Functionally
//! equivalent to the scanline path by contract.

use super::{paint_plan, to_pixel_space, RasterFrame, Rasterizer};
use crate::geometry::{BoundingBox2, Point2, Polygon};
use crate::CoordF;

/// One triangle of the batch plus the color it paints.
#[derive(Clone, Copy, Debug)]
struct BatchTriangle {
    a: Point2,
    b: Point2,
    c: Point2,
    color: u8,
}

/// Triangle-batch rasterizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchRasterizer;

impl BatchRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn rasterize_triangle(frame: &mut RasterFrame, tri: &BatchTriangle) {
        let min_x = tri.a.x.min(tri.b.x).min(tri.c.x).floor().max(0.0) as usize;
        let min_y = tri.a.y.min(tri.b.y).min(tri.c.y).floor().max(0.0) as usize;
        let max_x =
            (tri.a.x.max(tri.b.x).max(tri.c.x).ceil() as isize).clamp(0, frame.width() as isize)
                as usize;
        let max_y =
            (tri.a.y.max(tri.b.y).max(tri.c.y).ceil() as isize).clamp(0, frame.height() as isize)
                as usize;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Point2::new(x as CoordF + 0.5, y as CoordF + 0.5);
                if point_in_triangle(&p, &tri.a, &tri.b, &tri.c) {
                    frame.set(x, y, tri.color);
                }
            }
        }
    }
}

impl Rasterizer for BatchRasterizer {
    fn rasterize(
        &self,
        polygons: &[Polygon],
        original_bounds: &BoundingBox2,
        pixel_width: usize,
        pixel_height: usize,
    ) -> RasterFrame {
        // Build the whole layer's triangle batch first (the "vertex
        // buffer"), then draw it in one pass.
        let mut batch: Vec<BatchTriangle> = Vec::new();
        for (index, color) in paint_plan(polygons) {
            let pixel_points: Vec<Point2> = polygons[index]
                .points()
                .iter()
                .map(|p| to_pixel_space(p, original_bounds, pixel_width, pixel_height))
                .collect();
            for [a, b, c] in triangulate(&pixel_points) {
                batch.push(BatchTriangle { a, b, c, color });
            }
        }

        let mut frame = RasterFrame::new(pixel_width, pixel_height);
        for tri in &batch {
            Self::rasterize_triangle(&mut frame, tri);
        }
        frame
    }
}

/// Ear-clipping triangulation of a simple polygon.
///
/// Works on a counter-clockwise copy; the caller's winding only selects
/// the paint color. Falls back to fan triangulation when no ear is found
/// (collinear remnants at the tail of clipping).
fn triangulate(points: &[Point2]) -> Vec<[Point2; 3]> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let mut verts: Vec<Point2> = points.to_vec();
    if signed_area(&verts) < 0.0 {
        verts.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    while verts.len() > 3 {
        let m = verts.len();
        let mut clipped = false;
        for i in 0..m {
            let prev = verts[(i + m - 1) % m];
            let cur = verts[i];
            let next = verts[(i + 1) % m];

            // Reflex corners cannot be ears.
            if (cur - prev).cross(&(next - cur)) <= 0.0 {
                continue;
            }
            // No other vertex may lie inside the candidate ear.
            let blocked = verts
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != (i + m - 1) % m && *j != i && *j != (i + 1) % m)
                .any(|(_, p)| point_in_triangle(p, &prev, &cur, &next));
            if blocked {
                continue;
            }

            triangles.push([prev, cur, next]);
            verts.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            // Degenerate remainder; fan out what is left.
            for i in 1..verts.len() - 1 {
                triangles.push([verts[0], verts[i], verts[i + 1]]);
            }
            return triangles;
        }
    }
    triangles.push([verts[0], verts[1], verts[2]]);
    triangles
}

fn signed_area(points: &[Point2]) -> CoordF {
    let mut sum = 0.0;
    for i in 0..points.len() {
        sum += points[i].cross(&points[(i + 1) % points.len()]);
    }
    sum * 0.5
}

/// Inclusive point-in-triangle test, orientation independent.
fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let d1 = (*p - *a).cross(&(*b - *a));
    let d2 = (*p - *b).cross(&(*c - *b));
    let d3 = (*p - *c).cross(&(*a - *c));
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{ScanlineRasterizer, BACKGROUND, FOREGROUND};
    use super::*;

    #[test]
    fn triangulation_covers_polygon_area() {
        let square = centered_square(1.0);
        let tris = triangulate(square.points());
        assert_eq!(tris.len(), 2);
        let total: f64 = tris
            .iter()
            .map(|[a, b, c]| 0.5 * ((*b - *a).cross(&(*c - *a))).abs())
            .sum();
        assert!((total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn concave_polygon_triangulates_fully() {
        let concave = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(2.0, 1.5),
            Point2::new(0.0, 4.0),
        ];
        let tris = triangulate(&concave);
        assert_eq!(tris.len(), 3);
        let total: f64 = tris
            .iter()
            .map(|[a, b, c]| 0.5 * ((*b - *a).cross(&(*c - *a))).abs())
            .sum();
        assert!((total - signed_area(&concave).abs()).abs() < 1e-9);
    }

    #[test]
    fn batch_lights_center_not_corners() {
        let square = centered_square(0.5);
        let bounds = centered_bounds(2.0, 2.0);
        let frame = BatchRasterizer::new().rasterize(&[square], &bounds, 100, 100);
        assert_eq!(frame.get(50, 50), FOREGROUND);
        assert_eq!(frame.get(0, 0), BACKGROUND);
    }

    #[test]
    fn batch_matches_scanline_coverage() {
        // The two paths share one contract; their coverage must agree
        // within edge-sampling tolerance.
        let outer = centered_square(0.8);
        let mut hole = centered_square(0.3);
        hole.reverse();
        let bounds = centered_bounds(2.0, 2.0);

        let fast = BatchRasterizer::new().rasterize(
            &[outer.clone(), hole.clone()],
            &bounds,
            128,
            128,
        );
        let reference = ScanlineRasterizer::new().rasterize(&[outer, hole], &bounds, 128, 128);
        assert!((fast.coverage() - reference.coverage()).abs() < 0.02);
    }
}

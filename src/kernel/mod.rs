//! Geometry kernel: the cross-section capability.
//!
//! The slicer does not compute plane/triangle intersections itself; it
//! talks to a [`GeometryKernel`] handed in at construction. [`SectionKernel`]
//! is the built-in implementation: triangle/plane intersection with
//! sign-classified vertices, segment stitching into closed contours, and
//! winding normalization by containment parity.

use crate::geometry::{Point2, Point3, Polygon};
use crate::mesh::TriangleMesh;
use crate::CoordF;
use log::debug;

/// Tolerance for matching segment endpoints while stitching contours.
const STITCH_EPSILON: CoordF = 1e-4;

/// The cross-section capability consumed by the slicer.
///
/// Implementations must return closed 2D polygons with a consistent winding
/// convention: counter-clockwise contours are solid boundaries,
/// clockwise contours are holes.
pub trait GeometryKernel {
    /// Compute the solid cross-section of `mesh` at the given Z height.
    fn cross_section(&self, mesh: &TriangleMesh, height: CoordF) -> Vec<Polygon>;
}

impl<K: GeometryKernel + ?Sized> GeometryKernel for &K {
    fn cross_section(&self, mesh: &TriangleMesh, height: CoordF) -> Vec<Polygon> {
        (**self).cross_section(mesh, height)
    }
}

/// Built-in cross-section kernel.
///
/// Intersects every triangle with the horizontal plane at the requested
/// height, stitches the resulting segments into contours, and normalizes
/// winding so nesting depth alone distinguishes solids from holes.
#[derive(Debug, Clone, Default)]
pub struct SectionKernel {
    _private: (),
}

impl SectionKernel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeometryKernel for SectionKernel {
    fn cross_section(&self, mesh: &TriangleMesh, height: CoordF) -> Vec<Polygon> {
        let mut segments: Vec<(Point2, Point2)> = Vec::new();

        for tri in mesh.triangles() {
            let (lo, hi) = tri.z_range();
            if hi < height || lo > height {
                continue;
            }
            if let Some(seg) = triangle_plane_section(&tri.a, &tri.b, &tri.c, height) {
                segments.push(seg);
            }
        }

        if segments.is_empty() {
            return Vec::new();
        }

        let contours = connect_segments(&segments);
        let mut polygons: Vec<Polygon> = contours
            .into_iter()
            .map(|c| Polygon::from_points(remove_collinear_points(c)))
            .filter(Polygon::is_valid)
            .collect();

        normalize_windings(&mut polygons);
        debug!(
            "cross-section at z={}: {} segments -> {} contours",
            height,
            segments.len(),
            polygons.len()
        );
        polygons
    }
}

/// Intersect one triangle with the plane `z = height`.
///
/// Returns the section segment when the plane properly crosses the
/// triangle. Triangles touching the plane in a single vertex or lying
/// entirely in the plane contribute nothing.
fn triangle_plane_section(
    a: &Point3,
    b: &Point3,
    c: &Point3,
    height: CoordF,
) -> Option<(Point2, Point2)> {
    let verts = [a, b, c];
    let dist: Vec<CoordF> = verts.iter().map(|v| v.z - height).collect();
    let sign: Vec<i8> = dist
        .iter()
        .map(|d| {
            if *d > 0.0 {
                1
            } else if *d < 0.0 {
                -1
            } else {
                0
            }
        })
        .collect();

    let mut hits: Vec<Point2> = Vec::with_capacity(2);
    for i in 0..3 {
        let j = (i + 1) % 3;
        if sign[i] != sign[j] {
            let t = dist[i] / (dist[i] - dist[j]);
            let p = *verts[i] + (*verts[j] - *verts[i]) * t;
            hits.push(p.to_2d());
        }
    }

    match hits.len() {
        2 => Some((hits[0], hits[1])),
        // Vertex exactly on the plane produces 3 edge crossings, two of
        // them coincident at the vertex; collapse to the proper chord.
        3 => {
            hits.dedup_by(|p, q| p.approx_eq(q, STITCH_EPSILON));
            if hits.len() == 2 {
                Some((hits[0], hits[1]))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Stitch unordered section segments into closed contours.
///
/// Greedy chain extension with tolerance-based endpoint matching; a contour
/// is closed when its tail returns to its head. Chains that never close are
/// dropped (they come from non-manifold edges or numeric noise).
fn connect_segments(segments: &[(Point2, Point2)]) -> Vec<Vec<Point2>> {
    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut contour = vec![segments[start].0, segments[start].1];

        loop {
            let tail = *contour.last().unwrap_or(&segments[start].0);
            let mut extended = false;
            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if tail.approx_eq(&seg.0, STITCH_EPSILON) {
                    contour.push(seg.1);
                    used[i] = true;
                    extended = true;
                    break;
                } else if tail.approx_eq(&seg.1, STITCH_EPSILON) {
                    contour.push(seg.0);
                    used[i] = true;
                    extended = true;
                    break;
                }
            }
            if !extended {
                break;
            }
        }

        // Closed when the chain returns to its first point.
        if contour.len() > 3 {
            let first = contour[0];
            let last = *contour.last().unwrap_or(&first);
            if first.approx_eq(&last, STITCH_EPSILON) {
                contour.pop();
                contours.push(contour);
            }
        }
    }

    contours
}

/// Remove duplicate and collinear vertices from a closed contour.
///
/// Adjacent triangles sharing a face plane split section edges at their
/// common edge; those midpoints carry no shape information.
fn remove_collinear_points(points: Vec<Point2>) -> Vec<Point2> {
    if points.len() < 3 {
        return points;
    }
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    let n = points.len();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        if cur.approx_eq(&prev, STITCH_EPSILON) {
            continue;
        }
        let cross = (cur - prev).cross(&(next - cur));
        if cross.abs() > 1e-9 {
            out.push(cur);
        }
    }
    out
}

/// Normalize windings so contours at even nesting depth run
/// counter-clockwise (solid) and odd-depth contours run clockwise (holes).
fn normalize_windings(polygons: &mut [Polygon]) {
    let depths: Vec<usize> = (0..polygons.len())
        .map(|i| {
            let probe = polygons[i].points()[0];
            polygons
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && other.contains(&probe))
                .count()
        })
        .collect();

    for (poly, depth) in polygons.iter_mut().zip(depths) {
        let should_be_ccw = depth % 2 == 0;
        if poly.is_counter_clockwise() != should_be_ccw {
            poly.reverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;

    #[test]
    fn cube_midheight_section_is_square() {
        let cube = TriangleMesh::cube(1.0);
        let kernel = SectionKernel::new();
        let polys = kernel.cross_section(&cube, 0.5);

        assert_eq!(polys.len(), 1);
        let square = &polys[0];
        assert_eq!(square.len(), 4);
        assert!((square.area() - 1.0).abs() < 1e-9);
        assert!(square.is_counter_clockwise());

        let bb = square.bounding_box();
        assert!(bb.min.approx_eq(&Point2::new(0.0, 0.0), 1e-9));
        assert!(bb.max.approx_eq(&Point2::new(1.0, 1.0), 1e-9));
    }

    #[test]
    fn section_above_mesh_is_empty() {
        let cube = TriangleMesh::cube(1.0);
        let kernel = SectionKernel::new();
        assert!(kernel.cross_section(&cube, 2.0).is_empty());
    }

    #[test]
    fn triangle_crossing_plane_yields_segment() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 1.0);
        let c = Point3::new(0.0, 1.0, 1.0);
        let seg = triangle_plane_section(&a, &b, &c, 0.5).unwrap();
        assert!(seg.0.approx_eq(&Point2::new(0.5, 0.0), 1e-9));
        assert!(seg.1.approx_eq(&Point2::new(0.0, 0.5), 1e-9));
    }

    #[test]
    fn triangle_below_plane_yields_nothing() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.2);
        let c = Point3::new(0.0, 1.0, 0.1);
        assert!(triangle_plane_section(&a, &b, &c, 0.5).is_none());
    }

    #[test]
    fn open_chains_are_dropped() {
        let segments = vec![
            (Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)),
            (Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)),
        ];
        assert!(connect_segments(&segments).is_empty());
    }

    #[test]
    fn square_segments_stitch_into_one_contour() {
        let segments = vec![
            (Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)),
            (Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)),
            (Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)),
            (Point2::new(0.0, 1.0), Point2::new(0.0, 0.0)),
        ];
        let contours = connect_segments(&segments);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn collinear_midpoints_are_removed() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let cleaned = remove_collinear_points(contour);
        assert_eq!(cleaned.len(), 4);
    }

    #[test]
    fn nested_contour_becomes_hole() {
        let outer = Polygon::from_points(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ]);
        let inner = Polygon::from_points(vec![
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 1.0),
            Point2::new(3.0, 3.0),
            Point2::new(1.0, 3.0),
        ]);
        let mut polys = vec![outer, inner];
        normalize_windings(&mut polys);
        assert!(polys[0].is_counter_clockwise());
        assert!(polys[1].is_hole());
    }
}

//! Triangle mesh representation and STL ingestion.
//!
//! The pipeline only depends on the indexed vertex/triangle buffers; the
//! STL reader is a thin front end that fills them. Both binary and ASCII
//! STL are accepted, detected from the file contents rather than a header
//! claim (many binary files start with the bytes `solid`).

use crate::geometry::{BoundingBox3, Point3, TransformationMatrix};
use crate::{Error, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// A single triangle, expanded from the index buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle {
    pub const fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Face normal (not normalized).
    pub fn normal(&self) -> Point3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Lowest and highest Z among the three vertices.
    pub fn z_range(&self) -> (f64, f64) {
        let lo = self.a.z.min(self.b.z).min(self.c.z);
        let hi = self.a.z.max(self.b.z).max(self.c.z);
        (lo, hi)
    }
}

/// An indexed triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Build a mesh from vertex and triangle-index buffers.
    ///
    /// Fails when an index points past the vertex buffer.
    pub fn from_indexed(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Result<Self> {
        let n = vertices.len() as u32;
        for tri in &indices {
            if tri.iter().any(|&i| i >= n) {
                return Err(Error::Mesh(format!(
                    "triangle index out of range: {:?} (vertex count {})",
                    tri, n
                )));
            }
        }
        Ok(Self { vertices, indices })
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Expand triangle `i` from the index buffer.
    pub fn triangle(&self, i: usize) -> Triangle {
        let [a, b, c] = self.indices[i];
        Triangle::new(
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        )
    }

    /// Iterate all triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        (0..self.indices.len()).map(move |i| self.triangle(i))
    }

    /// Axis-aligned bounding box of the vertex set.
    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(&self.vertices)
    }

    /// Apply a placement transform to every vertex in place.
    pub fn transform(&mut self, matrix: &TransformationMatrix) {
        for vertex in &mut self.vertices {
            *vertex = matrix.transform_point(vertex);
        }
    }

    /// Translate the mesh in place.
    pub fn translate(&mut self, offset: Point3) {
        self.transform(&TransformationMatrix::translation(
            offset.x, offset.y, offset.z,
        ));
    }

    /// An axis-aligned cube of the given edge length, corner at the origin.
    /// 8 vertices, 12 triangles, outward-facing windings.
    pub fn cube(size: f64) -> Self {
        let s = size;
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(s, 0.0, 0.0),
            Point3::new(s, s, 0.0),
            Point3::new(0.0, s, 0.0),
            Point3::new(0.0, 0.0, s),
            Point3::new(s, 0.0, s),
            Point3::new(s, s, s),
            Point3::new(0.0, s, s),
        ];
        let indices = vec![
            // bottom (z=0, normal -Z)
            [0, 2, 1],
            [0, 3, 2],
            // top (z=s, normal +Z)
            [4, 5, 6],
            [4, 6, 7],
            // front (y=0, normal -Y)
            [0, 1, 5],
            [0, 5, 4],
            // right (x=s, normal +X)
            [1, 2, 6],
            [1, 6, 5],
            // back (y=s, normal +Y)
            [2, 3, 7],
            [2, 7, 6],
            // left (x=0, normal -X)
            [3, 0, 4],
            [3, 4, 7],
        ];
        Self { vertices, indices }
    }
}

/// Load a triangle mesh from an STL file (binary or ASCII).
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let data = fs::read(path.as_ref())?;
    let mesh = if looks_like_ascii_stl(&data) {
        parse_ascii_stl(&data)?
    } else {
        parse_binary_stl(&data)?
    };
    if mesh.is_empty() {
        return Err(Error::Mesh("STL file contains no triangles".into()));
    }
    debug!(
        "loaded {} triangles from {}",
        mesh.triangle_count(),
        path.as_ref().display()
    );
    Ok(mesh)
}

fn looks_like_ascii_stl(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return false;
    }
    // Binary files may also start with "solid"; require an actual "facet"
    // token somewhere in the first kilobyte.
    let probe = &data[..data.len().min(1024)];
    String::from_utf8_lossy(probe).contains("facet")
}

fn parse_binary_stl(data: &[u8]) -> Result<TriangleMesh> {
    if data.len() < 84 {
        return Err(Error::Mesh("binary STL shorter than its header".into()));
    }
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = 84 + count * 50;
    if data.len() < expected {
        return Err(Error::Mesh(format!(
            "binary STL truncated: {} bytes, expected {}",
            data.len(),
            expected
        )));
    }

    let mut vertices = Vec::with_capacity(count * 3);
    let mut indices = Vec::with_capacity(count);
    for i in 0..count {
        // 12 bytes of normal (ignored), then three vertices.
        let base = 84 + i * 50 + 12;
        let tri_base = vertices.len() as u32;
        for v in 0..3 {
            let o = base + v * 12;
            vertices.push(Point3::new(
                read_f32(data, o) as f64,
                read_f32(data, o + 4) as f64,
                read_f32(data, o + 8) as f64,
            ));
        }
        indices.push([tri_base, tri_base + 1, tri_base + 2]);
    }
    TriangleMesh::from_indexed(vertices, indices)
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn parse_ascii_stl(data: &[u8]) -> Result<TriangleMesh> {
    let text = String::from_utf8_lossy(data);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut facet: Vec<Point3> = Vec::with_capacity(3);

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("vertex") {
            let coords: Vec<f64> = rest
                .split_whitespace()
                .map(|t| {
                    t.parse::<f64>()
                        .map_err(|_| Error::Mesh(format!("bad vertex coordinate: {}", t)))
                })
                .collect::<Result<_>>()?;
            if coords.len() != 3 {
                return Err(Error::Mesh(format!("bad vertex line: {}", line)));
            }
            facet.push(Point3::new(coords[0], coords[1], coords[2]));
        } else if line.starts_with("endfacet") {
            if facet.len() != 3 {
                return Err(Error::Mesh(format!(
                    "facet has {} vertices, expected 3",
                    facet.len()
                )));
            }
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&facet);
            indices.push([base, base + 1, base + 2]);
            facet.clear();
        }
    }
    TriangleMesh::from_indexed(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles() {
        let cube = TriangleMesh::cube(1.0);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertices().len(), 8);

        let bb = cube.bounding_box();
        assert_eq!(bb.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bb.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn cube_normals_face_outward() {
        let cube = TriangleMesh::cube(2.0);
        // Every face normal should point away from the cube center.
        let center = cube.bounding_box().center();
        for tri in cube.triangles() {
            let face_center = (tri.a + tri.b + tri.c).scaled(1.0 / 3.0);
            let outward = face_center - center;
            assert!(tri.normal().dot(&outward) > 0.0);
        }
    }

    #[test]
    fn translate_shifts_bounding_box() {
        let mut cube = TriangleMesh::cube(1.0);
        cube.translate(Point3::new(-0.5, -0.5, 0.0));
        let bb = cube.bounding_box();
        assert_eq!(bb.min, Point3::new(-0.5, -0.5, 0.0));
        assert_eq!(bb.max, Point3::new(0.5, 0.5, 1.0));
    }

    #[test]
    fn scaling_transform_grows_the_mesh() {
        let mut cube = TriangleMesh::cube(1.0);
        cube.transform(&TransformationMatrix::scaling(2.0, 2.0, 2.0));
        let bb = cube.bounding_box();
        assert_eq!(bb.max, Point3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let verts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(TriangleMesh::from_indexed(verts, vec![[0, 1, 2]]).is_err());
    }

    #[test]
    fn ascii_stl_roundtrip() {
        let stl = "solid test\n\
                   facet normal 0 0 1\n\
                   outer loop\n\
                   vertex 0 0 0\n\
                   vertex 1 0 0\n\
                   vertex 0 1 0\n\
                   endloop\n\
                   endfacet\n\
                   endsolid test\n";
        let mesh = parse_ascii_stl(stl.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangle(0).b, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn binary_stl_roundtrip() {
        // One triangle: 80-byte header, count, 50-byte record.
        let mut data = vec![0u8; 84 + 50];
        data[80..84].copy_from_slice(&1u32.to_le_bytes());
        let verts: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for (i, v) in verts.iter().enumerate() {
            let o = 84 + 12 + i * 4;
            data[o..o + 4].copy_from_slice(&v.to_le_bytes());
        }
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.triangle(0).c, Point3::new(0.0, 1.0, 0.0));
    }
}

//! The slicing engine.

use super::{SliceLayer, SlicingParams};
use crate::kernel::GeometryKernel;
use crate::mesh::TriangleMesh;
use crate::{Error, Result};
use log::{debug, info};

/// Drives a [`GeometryKernel`] across the model's height range at a fixed
/// pitch, producing an ordered layer sequence.
///
/// The kernel is injected at construction; the slicer never computes
/// plane/triangle intersections itself. Each height is independent, so
/// callers may slice layers in parallel; this implementation walks them in
/// order since cross-sectioning is cheap next to rasterization.
pub struct Slicer<K: GeometryKernel> {
    kernel: K,
    params: SlicingParams,
}

impl<K: GeometryKernel> Slicer<K> {
    pub fn new(kernel: K, params: SlicingParams) -> Self {
        Self { kernel, params }
    }

    pub fn params(&self) -> &SlicingParams {
        &self.params
    }

    /// Slice the mesh into its full layer stack.
    ///
    /// Fails with [`Error::EmptyMesh`] when no layer yields any geometry;
    /// individual empty layers within an otherwise solid model are kept
    /// (the printer needs the layer record even when the mask is blank).
    pub fn slice(&self, mesh: &TriangleMesh) -> Result<Vec<SliceLayer>> {
        self.slice_with_progress(mesh, |_, _| {})
    }

    /// Slice with a per-layer progress notification `(done, total)`.
    pub fn slice_with_progress<F>(&self, mesh: &TriangleMesh, mut progress: F) -> Result<Vec<SliceLayer>>
    where
        F: FnMut(usize, usize),
    {
        if mesh.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let bb = mesh.bounding_box();
        let model_height = bb.size().z;
        let count = self.params.layer_count(model_height);
        if count == 0 {
            return Err(Error::EmptyMesh);
        }

        info!(
            "slicing {} layers at {} mm pitch (model height {:.3} mm)",
            count, self.params.layer_height, model_height
        );

        let mut layers = Vec::with_capacity(count);
        let mut any_geometry = false;

        for i in 0..count {
            let height = bb.min.z + self.params.height_of(i);
            let polygons = self.kernel.cross_section(mesh, height);
            if polygons.is_empty() {
                debug!("layer {} at z={:.4} is empty", i, height);
            } else {
                any_geometry = true;
            }
            layers.push(SliceLayer::new(i, height, polygons));
            progress(i + 1, count);
        }

        if !any_geometry {
            return Err(Error::EmptyMesh);
        }
        Ok(layers)
    }
}

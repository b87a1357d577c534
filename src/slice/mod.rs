//! Slicing module - converts meshes into layers.
//!
//! - [`Slicer`] - drives the geometry kernel across a height range
//! - [`SliceLayer`] - one cross-section: height plus polygon set
//! - [`SlicingParams`] - layer pitch and first-layer offset scheme

mod layer;
mod slicer;
mod slicing_params;

pub use layer::SliceLayer;
pub use slicer::Slicer;
pub use slicing_params::SlicingParams;

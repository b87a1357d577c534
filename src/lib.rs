//! # resin-slicer
//!
//! A mesh-to-GOO slicing pipeline for mask-projection (resin) 3D printing.
//!
//! This library turns a watertight triangle mesh into a stack of per-layer
//! grayscale masks and serializes them into a printer-ready `.goo` job file:
//! - Horizontal cross-sectioning of the mesh into closed polygon contours
//! - Grid infill derived from contour/line intersections and parity pairing
//! - Rasterization of contours into fixed-resolution grayscale frames
//! - RLE encoding into the GOO binary container
//!
//! ## Example
//!
//! ```rust,ignore
//! use resin_slicer::{load_stl, JobConfig, Pipeline};
//!
//! let mesh = load_stl("model.stl")?;
//! let config = JobConfig::default();
//! let pipeline = Pipeline::new(config);
//! pipeline.export_to_file(&mesh, "output.goo")?;
//! ```

pub mod config;
pub mod geometry;
pub mod goo;
pub mod infill;
pub mod kernel;
pub mod mesh;
pub mod pipeline;
pub mod raster;
pub mod slice;

pub use config::{ExposureSettings, JobConfig, PlatformSettings};
pub use geometry::{
    BoundingBox2, BoundingBox3, Line, Point2, Point3, Polygon, TransformationMatrix,
};
pub use goo::{decode_rle, encode_rle, GooDocument, GooHeader, GooLayer, GooWriter, PatchToken};
pub use infill::{InfillConfig, InfillGenerator, InfillResult, Segment};
pub use kernel::{GeometryKernel, SectionKernel};
pub use mesh::{load_stl, Triangle, TriangleMesh};
pub use pipeline::{ExportSummary, Pipeline, PipelineStage};
pub use raster::{BatchRasterizer, RasterFrame, Rasterizer, ScanlineRasterizer};
pub use slice::{SliceLayer, Slicer, SlicingParams};

/// Floating-point coordinate type used throughout the pipeline.
///
/// Model space is millimeters; the rasterizer converts to pixel space.
pub type CoordF = f64;

/// Result type used throughout the slicer.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for slicer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mesh error: {0}")]
    Mesh(String),

    #[error("Mesh produced no geometry at any layer height")]
    EmptyMesh,

    #[error("Degenerate layer {layer}: {reason}")]
    DegenerateLayer { layer: usize, reason: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Offset patch error: {0}")]
    OffsetPatch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cancelled")]
    Cancelled,
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

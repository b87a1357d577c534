//! Grid infill generation.
//!
//! Fills a layer's interior with a grid of diagonal line segments:
//!
//! 1. For each configured direction, build a family of parallel lines
//!    spaced by the density-derived pitch, offset by integer multiples of
//!    the pitch from a reference line through the origin. The family is
//!    bounded by the signed distances of the layer bounding-box corners to
//!    the reference line.
//! 2. Intersect each line with every contour edge.
//! 3. Deduplicate coincident hits (vertex grazing), sort by projection
//!    along the line direction, and pair consecutive points with even-odd
//!    parity. A trailing unpaired point is a tangency and is dropped.
//!
//! Every pair becomes one segment of cured material.

use crate::geometry::{BoundingBox2, Line, Point2};
use crate::slice::SliceLayer;
use crate::CoordF;
use log::trace;
use serde::{Deserialize, Serialize};

/// Tolerance for collapsing coincident intersection points.
const DEDUP_EPSILON: CoordF = 1e-6;

/// Configuration for grid infill.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfillConfig {
    /// Fill density in (0, 1]; 1.0 means lines one width apart.
    pub density: CoordF,
    /// Nominal cured line width (mm); pitch = width / density.
    pub line_width: CoordF,
    /// Line directions in degrees. The default crossing diagonals.
    pub directions: Vec<CoordF>,
}

impl Default for InfillConfig {
    fn default() -> Self {
        Self {
            density: 0.2,
            line_width: 1.0,
            directions: vec![45.0, -45.0],
        }
    }
}

impl InfillConfig {
    /// Distance between adjacent fill lines.
    pub fn line_spacing(&self) -> CoordF {
        if self.density <= 0.0 {
            return CoordF::MAX;
        }
        self.line_width / self.density.min(1.0)
    }
}

/// One infill segment: the entering and exiting crossing of solid material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

/// Infill for one layer; always an even-derived pairing of crossings.
#[derive(Clone, Debug, Default)]
pub struct InfillResult {
    pub segments: Vec<Segment>,
}

impl InfillResult {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_length(&self) -> CoordF {
        self.segments
            .iter()
            .map(|s| s.start.distance_to(&s.end))
            .sum()
    }
}

/// Grid infill generator.
#[derive(Clone, Debug, Default)]
pub struct InfillGenerator {
    config: InfillConfig,
}

impl InfillGenerator {
    pub fn new(config: InfillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InfillConfig {
        &self.config
    }

    /// Generate grid infill for one layer.
    ///
    /// `bounds` is the model's overall XY bounding box so the grid stays
    /// registered across layers. Invalid contours (fewer than 3 points)
    /// are ignored.
    pub fn generate(&self, layer: &SliceLayer, bounds: &BoundingBox2) -> InfillResult {
        let mut result = InfillResult::default();
        if layer.is_empty() || self.config.density <= 0.0 || !bounds.defined {
            return result;
        }

        let spacing = self.config.line_spacing();
        if !spacing.is_finite() || spacing <= 0.0 {
            return result;
        }

        for angle_deg in &self.config.directions {
            self.grid_pass(layer, bounds, angle_deg.to_radians(), spacing, &mut result);
        }
        trace!(
            "layer {}: {} infill segments",
            layer.index,
            result.segments.len()
        );
        result
    }

    fn grid_pass(
        &self,
        layer: &SliceLayer,
        bounds: &BoundingBox2,
        angle_rad: CoordF,
        spacing: CoordF,
        result: &mut InfillResult,
    ) {
        let (sin_a, cos_a) = angle_rad.sin_cos();
        let dir = Point2::new(cos_a, sin_a);
        let normal = Point2::new(-sin_a, cos_a);

        // Signed distances of the box corners to the reference line through
        // the origin bound the family: lines outside [lo, hi] miss the box.
        let corner_dots = bounds.corners().map(|c| c.dot(&normal));
        let lo = corner_dots.iter().cloned().fold(CoordF::INFINITY, CoordF::min);
        let hi = corner_dots
            .iter()
            .cloned()
            .fold(CoordF::NEG_INFINITY, CoordF::max);

        let k_min = (lo / spacing).ceil() as i64;
        let k_max = (hi / spacing).floor() as i64;
        let reach = bounds.radius() + spacing;

        for k in k_min..=k_max {
            let offset = normal * (k as CoordF * spacing);
            // Anchor near the box center so the finite carrier comfortably
            // spans the box.
            let anchor = offset + dir * bounds.center().dot(&dir);
            let carrier = Line::new(anchor - dir * reach, anchor + dir * reach);

            let mut hits = collect_intersections(&carrier, layer);
            if hits.len() < 2 {
                continue;
            }

            // Sort by projected distance along the line direction.
            hits.sort_by(|a, b| {
                a.dot(&dir)
                    .partial_cmp(&b.dot(&dir))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            dedup_points(&mut hits);

            // Even-odd pairing: 0-1 enters/exits solid, 2-3, ... A trailing
            // unpaired point is a boundary tangency, not an error.
            for pair in hits.chunks_exact(2) {
                result.segments.push(Segment {
                    start: pair[0],
                    end: pair[1],
                });
            }
        }
    }
}

/// Intersect a carrier line with every valid contour edge of the layer.
fn collect_intersections(carrier: &Line, layer: &SliceLayer) -> Vec<Point2> {
    let mut hits = Vec::new();
    for polygon in &layer.polygons {
        if !polygon.is_valid() {
            continue;
        }
        for edge in polygon.edges() {
            if let Some(p) = carrier.intersection_with_segment(&edge) {
                hits.push(p);
            }
        }
    }
    hits
}

/// Collapse consecutive coincident points (the sorted hit list puts
/// duplicates from vertex-grazing lines next to each other).
fn dedup_points(points: &mut Vec<Point2>) {
    points.dedup_by(|a, b| a.approx_eq(b, DEDUP_EPSILON));
}

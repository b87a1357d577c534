//! Rasterization of layer contours into grayscale frames.
//!
//! Two implementations of the [`Rasterizer`] contract:
//! - [`ScanlineRasterizer`] - CPU path fill, one scanline at a time
//! - [`BatchRasterizer`] - triangulates contours into a flat vertex list
//!   and rasterizes the triangles in one pass, the layout a GPU backend
//!   consumes
//!
//! Both classify contours by winding sign: counter-clockwise contours are
//! filled with the foreground color, clockwise contours (holes) with the
//! background color. Contours are painted largest-first so holes overwrite
//! the solids that contain them.
//!
//! Coordinate mapping places the model origin at the image center:
//! `pixel = (model / original_extent + 0.5) * pixel_extent`.

mod batch;
mod scanline;

pub use batch::BatchRasterizer;
pub use scanline::ScanlineRasterizer;

use crate::geometry::{BoundingBox2, Point2, Polygon};
use crate::CoordF;

/// Grayscale value for uncured pixels.
pub const BACKGROUND: u8 = 0;
/// Grayscale value for fully cured pixels.
pub const FOREGROUND: u8 = 255;

/// A width x height grayscale pixel buffer for one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterFrame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RasterFrame {
    /// An all-background frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![BACKGROUND; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel data, one byte per pixel.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.pixels[y * self.width + x] = value;
    }

    /// Fill a horizontal span `[x0, x1)` on row `y`, clamped to the frame.
    pub fn fill_span(&mut self, y: usize, x0: isize, x1: isize, value: u8) {
        if y >= self.height {
            return;
        }
        let x0 = x0.max(0) as usize;
        let x1 = (x1.max(0) as usize).min(self.width);
        if x0 >= x1 {
            return;
        }
        let row = y * self.width;
        self.pixels[row + x0..row + x1].fill(value);
    }

    /// Keep each pixel at the darker of the two frames, so a pixel stays
    /// cured only where both frames cure it. The frames must share
    /// dimensions.
    pub fn intersect(&mut self, other: &RasterFrame) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        for (p, q) in self.pixels.iter_mut().zip(&other.pixels) {
            *p = (*p).min(*q);
        }
    }

    /// Fraction of non-background pixels.
    pub fn coverage(&self) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let lit = self.pixels.iter().filter(|&&p| p != BACKGROUND).count();
        lit as f64 / self.pixels.len() as f64
    }
}

/// Contract shared by the scalar and batch rasterization paths.
///
/// Implementations are invoked one layer at a time so a job with thousands
/// of layers never materializes all frames at once.
pub trait Rasterizer {
    /// Rasterize one layer's contours into a fresh frame.
    ///
    /// `original_bounds` supplies the model-space extents mapped onto the
    /// full pixel area (typically the printer platform, centered on the
    /// origin).
    fn rasterize(
        &self,
        polygons: &[Polygon],
        original_bounds: &BoundingBox2,
        pixel_width: usize,
        pixel_height: usize,
    ) -> RasterFrame;
}

/// Map a model-space point into continuous pixel coordinates.
#[inline]
pub(crate) fn to_pixel_space(
    p: &Point2,
    original_bounds: &BoundingBox2,
    pixel_width: usize,
    pixel_height: usize,
) -> Point2 {
    let ex = original_bounds.width();
    let ey = original_bounds.height();
    let x = if ex > 0.0 { p.x / ex + 0.5 } else { 0.5 };
    let y = if ey > 0.0 { p.y / ey + 0.5 } else { 0.5 };
    Point2::new(x * pixel_width as CoordF, y * pixel_height as CoordF)
}

/// Painting order and color per contour: largest area first, foreground
/// for counter-clockwise contours, background for holes.
pub(crate) fn paint_plan(polygons: &[Polygon]) -> Vec<(usize, u8)> {
    let mut order: Vec<usize> = (0..polygons.len())
        .filter(|&i| polygons[i].is_valid())
        .collect();
    order.sort_by(|&a, &b| {
        polygons[b]
            .area()
            .partial_cmp(&polygons[a].area())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
        .into_iter()
        .map(|i| {
            let color = if polygons[i].is_counter_clockwise() {
                FOREGROUND
            } else {
                BACKGROUND
            };
            (i, color)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A platform-like box centered on the origin.
    pub fn centered_bounds(width: f64, height: f64) -> BoundingBox2 {
        BoundingBox2::from_points(&[
            Point2::new(-width * 0.5, -height * 0.5),
            Point2::new(width * 0.5, height * 0.5),
        ])
    }

    /// A square of the given half-extent centered on the origin.
    pub fn centered_square(half: f64) -> Polygon {
        Polygon::from_points(vec![
            Point2::new(-half, -half),
            Point2::new(half, -half),
            Point2::new(half, half),
            Point2::new(-half, half),
        ])
    }
}

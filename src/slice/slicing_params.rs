//! Slicing parameters.

use crate::CoordF;
use serde::{Deserialize, Serialize};

/// Configuration for the slicing process.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SlicingParams {
    /// Layer pitch (mm).
    pub layer_height: CoordF,
    /// Offset of the first cut above the model's lowest point (mm).
    ///
    /// Cutting exactly at the base plane tends to catch coplanar bottom
    /// faces; the usual choice is half a layer height.
    pub first_layer_offset: CoordF,
}

impl Default for SlicingParams {
    fn default() -> Self {
        Self {
            layer_height: 0.05,
            first_layer_offset: 0.025,
        }
    }
}

impl SlicingParams {
    pub fn new(layer_height: CoordF) -> Self {
        Self {
            layer_height,
            first_layer_offset: layer_height * 0.5,
        }
    }

    /// Number of layers needed to cover `model_height`.
    pub fn layer_count(&self, model_height: CoordF) -> usize {
        if model_height <= 0.0 || self.layer_height <= 0.0 {
            return 0;
        }
        (model_height / self.layer_height).ceil() as usize
    }

    /// Cut height of layer `index`, relative to the model's lowest point.
    pub fn height_of(&self, index: usize) -> CoordF {
        self.first_layer_offset + index as CoordF * self.layer_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_count_rounds_up() {
        let params = SlicingParams::new(0.05);
        assert_eq!(params.layer_count(1.0), 20);
        assert_eq!(params.layer_count(1.01), 21);
        assert_eq!(params.layer_count(0.0), 0);
    }

    #[test]
    fn heights_step_by_pitch() {
        let params = SlicingParams::new(1.0);
        assert!((params.height_of(0) - 0.5).abs() < 1e-12);
        assert!((params.height_of(3) - 3.5).abs() < 1e-12);
    }
}

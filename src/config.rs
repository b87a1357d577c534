//! Job configuration: printer platform, exposure schedule, slicing and
//! infill parameters.
//!
//! Configurations load from JSON files and validate before a job runs,
//! so a bad profile fails up front instead of partway through an export.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::infill::InfillConfig;
use crate::slice::SlicingParams;
use crate::{CoordF, Error, Result};

/// Physical printer description: mask resolution and build volume.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSettings {
    /// Mask width (pixels).
    pub x_resolution: u16,
    /// Mask height (pixels).
    pub y_resolution: u16,
    /// Build plate X extent (mm).
    pub x_size: CoordF,
    /// Build plate Y extent (mm).
    pub y_size: CoordF,
    /// Build volume Z extent (mm).
    pub z_size: CoordF,
    /// Mirror the mask horizontally for the optical path.
    pub x_mirror: bool,
    /// Mirror the mask vertically for the optical path.
    pub y_mirror: bool,
    /// Printer model name stamped into the job file.
    pub printer_name: String,
    /// Printer type string stamped into the job file.
    pub printer_type: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            x_resolution: 1440,
            y_resolution: 2560,
            x_size: 68.04,
            y_size: 120.96,
            z_size: 150.0,
            x_mirror: false,
            y_mirror: false,
            printer_name: String::new(),
            printer_type: "LCD".into(),
        }
    }
}

/// Cure and motion schedule for normal and bottom layers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureSettings {
    /// Normal layer exposure (s).
    pub exposure_time: CoordF,
    /// Bottom layer exposure (s).
    pub bottom_exposure_time: CoordF,
    /// Number of over-exposed bottom layers.
    pub bottom_layers: u32,
    /// Light-off dwell between layers (s).
    pub turn_off_time: CoordF,
    /// Lift distance after exposure (mm).
    pub lift_distance: CoordF,
    /// Lift speed (mm/min).
    pub lift_speed: CoordF,
    /// Bottom layer lift speed (mm/min).
    pub bottom_lift_speed: CoordF,
    /// Retract distance (mm).
    pub retract_distance: CoordF,
    /// Retract speed (mm/min).
    pub retract_speed: CoordF,
    /// UV power, 0..=255.
    pub light_pwm: u16,
    /// UV power for bottom layers, 0..=255.
    pub bottom_light_pwm: u16,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            exposure_time: 8.0,
            bottom_exposure_time: 60.0,
            bottom_layers: 6,
            turn_off_time: 1.0,
            lift_distance: 5.0,
            lift_speed: 100.0,
            bottom_lift_speed: 90.0,
            retract_distance: 5.0,
            retract_speed: 100.0,
            light_pwm: 255,
            bottom_light_pwm: 255,
        }
    }
}

impl ExposureSettings {
    /// Exposure time for a given layer index.
    pub fn exposure_for(&self, layer_index: usize) -> CoordF {
        if (layer_index as u32) < self.bottom_layers {
            self.bottom_exposure_time
        } else {
            self.exposure_time
        }
    }
}

/// Complete job configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub platform: PlatformSettings,
    pub exposure: ExposureSettings,
    pub slicing: SlicingParams,
    pub infill: InfillConfig,
    /// Emit grid infill segments into the mask in addition to solid
    /// contours. Off for fully solid parts.
    pub infill_enabled: bool,
    /// Profile name stamped into the job file.
    pub profile_name: String,
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set layer height (mm). Resets the first-layer
    /// offset to the usual half pitch.
    pub fn layer_height(mut self, height: CoordF) -> Self {
        self.slicing = SlicingParams::new(height);
        self
    }

    /// Builder method: set mask resolution (pixels).
    pub fn resolution(mut self, x: u16, y: u16) -> Self {
        self.platform.x_resolution = x;
        self.platform.y_resolution = y;
        self
    }

    /// Builder method: set build plate extents (mm).
    pub fn platform_size(mut self, x: CoordF, y: CoordF, z: CoordF) -> Self {
        self.platform.x_size = x;
        self.platform.y_size = y;
        self.platform.z_size = z;
        self
    }

    /// Builder method: enable grid infill with the given density.
    pub fn with_infill(mut self, density: CoordF) -> Self {
        self.infill_enabled = true;
        self.infill.density = density;
        self
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("cannot serialize config: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.slicing.layer_height <= 0.0 {
            return Err(Error::Config("layer height must be positive".into()));
        }
        if self.platform.x_resolution == 0 || self.platform.y_resolution == 0 {
            return Err(Error::Config("mask resolution must be nonzero".into()));
        }
        if self.platform.x_size <= 0.0 || self.platform.y_size <= 0.0 || self.platform.z_size <= 0.0
        {
            return Err(Error::Config("platform extents must be positive".into()));
        }
        if self.exposure.exposure_time <= 0.0 || self.exposure.bottom_exposure_time <= 0.0 {
            return Err(Error::Config("exposure times must be positive".into()));
        }
        if self.exposure.light_pwm > 255 || self.exposure.bottom_light_pwm > 255 {
            return Err(Error::Config("light PWM must be 0..=255".into()));
        }
        if self.infill_enabled {
            if !(self.infill.density > 0.0 && self.infill.density <= 1.0) {
                return Err(Error::Config("infill density must be in (0, 1]".into()));
            }
            if self.infill.line_width <= 0.0 {
                return Err(Error::Config("infill line width must be positive".into()));
            }
        }
        Ok(())
    }
}

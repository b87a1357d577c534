//! Header and per-layer definition records of the GOO container.

use super::writer::{GooWriter, PatchToken};

/// Fixed magic tag following the 4-byte version field.
pub const MAGIC_TAG: [u8; 8] = [0x07, 0x00, 0x00, 0x00, 0x44, 0x4C, 0x50, 0x00];

/// Trailer emitted after the last layer.
pub const ENDING_STRING: [u8; 18] = [
    0x0D, 0x0D, 0x0D, 0x0D, 0xD0, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0D, 0x44,
    0x4C, 0x50, 0x00,
];

pub const SMALL_PREVIEW_DIM: usize = 116;
pub const BIG_PREVIEW_DIM: usize = 290;

/// Complete file header. Field order and widths follow the printer
/// firmware's layout, so every field is written even when it holds a
/// default.
#[derive(Debug, Clone)]
pub struct GooHeader {
    pub version: String,
    pub software_info: String,
    pub software_version: String,
    pub file_time: String,
    pub printer_name: String,
    pub printer_type: String,
    pub profile_name: String,
    pub anti_aliasing_level: u16,
    pub grey_level: u16,
    pub blur_level: u16,
    /// RGB565 pixels, row-major, 116x116. Zeroed when absent.
    pub small_preview: Option<Vec<u16>>,
    /// RGB565 pixels, row-major, 290x290. Zeroed when absent.
    pub big_preview: Option<Vec<u16>>,
    pub total_layers: u32,
    pub x_resolution: u16,
    pub y_resolution: u16,
    pub x_mirror: bool,
    pub y_mirror: bool,
    pub x_size_platform: f32,
    pub y_size_platform: f32,
    pub z_size_platform: f32,
    pub layer_thickness: f32,
    pub exposure_time: f32,
    pub exposure_delay_mode: bool,
    pub turn_off_time: f32,
    pub bottom_before_lift_time: f32,
    pub bottom_after_lift_time: f32,
    pub bottom_after_retract_time: f32,
    pub before_lift_time: f32,
    pub after_lift_time: f32,
    pub after_retract_time: f32,
    pub bottom_exposure_time: f32,
    pub bottom_layers: u32,
    pub bottom_lift_distance: f32,
    pub bottom_lift_speed: f32,
    pub lift_distance: f32,
    pub lift_speed: f32,
    pub bottom_retract_distance: f32,
    pub bottom_retract_speed: f32,
    pub retract_distance: f32,
    pub retract_speed: f32,
    pub bottom_second_lift_distance: f32,
    pub bottom_second_lift_speed: f32,
    pub second_lift_distance: f32,
    pub second_lift_speed: f32,
    pub bottom_second_retract_distance: f32,
    pub bottom_second_retract_speed: f32,
    pub second_retract_distance: f32,
    pub second_retract_speed: f32,
    pub bottom_light_pwm: u16,
    pub light_pwm: u16,
    pub advance_mode: bool,
    pub printing_time: u32,
    pub total_volume: f32,
    pub total_weight: f32,
    pub total_price: f32,
    pub price_unit: String,
    pub gray_scale_level: bool,
    pub transition_layers: u16,
}

impl Default for GooHeader {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            software_info: String::new(),
            software_version: env!("CARGO_PKG_VERSION").into(),
            file_time: String::new(),
            printer_name: String::new(),
            printer_type: "LCD".into(),
            profile_name: "Standard Resin".into(),
            anti_aliasing_level: 4,
            grey_level: 8,
            blur_level: 0,
            small_preview: None,
            big_preview: None,
            total_layers: 0,
            x_resolution: 1440,
            y_resolution: 2560,
            x_mirror: false,
            y_mirror: false,
            x_size_platform: 68.04,
            y_size_platform: 120.96,
            z_size_platform: 150.0,
            layer_thickness: 0.05,
            exposure_time: 8.0,
            exposure_delay_mode: true,
            turn_off_time: 1.0,
            bottom_before_lift_time: 0.0,
            bottom_after_lift_time: 0.0,
            bottom_after_retract_time: 0.0,
            before_lift_time: 0.0,
            after_lift_time: 0.0,
            after_retract_time: 0.0,
            bottom_exposure_time: 60.0,
            bottom_layers: 6,
            bottom_lift_distance: 5.0,
            bottom_lift_speed: 90.0,
            lift_distance: 5.0,
            lift_speed: 100.0,
            bottom_retract_distance: 5.0,
            bottom_retract_speed: 100.0,
            retract_distance: 5.0,
            retract_speed: 100.0,
            bottom_second_lift_distance: 0.0,
            bottom_second_lift_speed: 0.0,
            second_lift_distance: 0.0,
            second_lift_speed: 0.0,
            bottom_second_retract_distance: 0.0,
            bottom_second_retract_speed: 0.0,
            second_retract_distance: 0.0,
            second_retract_speed: 0.0,
            bottom_light_pwm: 255,
            light_pwm: 255,
            advance_mode: false,
            printing_time: 0,
            total_volume: 0.0,
            total_weight: 0.0,
            total_price: 0.0,
            price_unit: "USD".into(),
            gray_scale_level: true,
            transition_layers: 0,
        }
    }
}

fn write_preview(w: &mut GooWriter, preview: Option<&[u16]>, dim: usize) {
    match preview {
        Some(pixels) => {
            for i in 0..dim * dim {
                w.write_u16(pixels.get(i).copied().unwrap_or(0));
            }
        }
        None => w.write_bytes(&vec![0u8; 2 * dim * dim]),
    }
}

impl GooHeader {
    /// Emit the header and hand back the token for the layer-content
    /// offset field, to be patched once the first layer's position is
    /// known.
    pub(super) fn write(&self, w: &mut GooWriter) -> PatchToken {
        w.write_str(&self.version, 4);
        w.write_bytes(&MAGIC_TAG);
        w.write_str(&self.software_info, 32);
        w.write_str(&self.software_version, 24);
        w.write_str(&self.file_time, 24);
        w.write_str(&self.printer_name, 32);
        w.write_str(&self.printer_type, 32);
        w.write_str(&self.profile_name, 32);
        w.write_u16(self.anti_aliasing_level);
        w.write_u16(self.grey_level);
        w.write_u16(self.blur_level);
        write_preview(w, self.small_preview.as_deref(), SMALL_PREVIEW_DIM);
        w.write_delimiter();
        write_preview(w, self.big_preview.as_deref(), BIG_PREVIEW_DIM);
        w.write_delimiter();
        w.write_u32(self.total_layers);
        w.write_u16(self.x_resolution);
        w.write_u16(self.y_resolution);
        w.write_bool(self.x_mirror);
        w.write_bool(self.y_mirror);
        w.write_f32(self.x_size_platform);
        w.write_f32(self.y_size_platform);
        w.write_f32(self.z_size_platform);
        w.write_f32(self.layer_thickness);
        w.write_f32(self.exposure_time);
        w.write_bool(self.exposure_delay_mode);
        w.write_f32(self.turn_off_time);
        w.write_f32(self.bottom_before_lift_time);
        w.write_f32(self.bottom_after_lift_time);
        w.write_f32(self.bottom_after_retract_time);
        w.write_f32(self.before_lift_time);
        w.write_f32(self.after_lift_time);
        w.write_f32(self.after_retract_time);
        w.write_f32(self.bottom_exposure_time);
        w.write_u32(self.bottom_layers);
        w.write_f32(self.bottom_lift_distance);
        w.write_f32(self.bottom_lift_speed);
        w.write_f32(self.lift_distance);
        w.write_f32(self.lift_speed);
        w.write_f32(self.bottom_retract_distance);
        w.write_f32(self.bottom_retract_speed);
        w.write_f32(self.retract_distance);
        w.write_f32(self.retract_speed);
        w.write_f32(self.bottom_second_lift_distance);
        w.write_f32(self.bottom_second_lift_speed);
        w.write_f32(self.second_lift_distance);
        w.write_f32(self.second_lift_speed);
        w.write_f32(self.bottom_second_retract_distance);
        w.write_f32(self.bottom_second_retract_speed);
        w.write_f32(self.second_retract_distance);
        w.write_f32(self.second_retract_speed);
        w.write_u16(self.bottom_light_pwm);
        w.write_u16(self.light_pwm);
        w.write_bool(self.advance_mode);
        w.write_u32(self.printing_time);
        w.write_f32(self.total_volume);
        w.write_f32(self.total_weight);
        w.write_f32(self.total_price);
        w.write_str(&self.price_unit, 8);
        let offset_token = w.reserve_u32();
        w.write_bool(self.gray_scale_level);
        w.write_u16(self.transition_layers);
        offset_token
    }
}

/// Per-layer motion and exposure record, written ahead of the layer's
/// encoded image.
#[derive(Debug, Clone)]
pub struct GooLayer {
    pub pause_flag: u16,
    pub pause_position_z: f32,
    pub layer_position_z: f32,
    pub layer_exposure_time: f32,
    pub layer_off_time: f32,
    pub before_lift_time: f32,
    pub after_lift_time: f32,
    pub after_retract_time: f32,
    pub lift_distance: f32,
    pub lift_speed: f32,
    pub second_lift_distance: f32,
    pub second_lift_speed: f32,
    pub retract_distance: f32,
    pub retract_speed: f32,
    pub second_retract_distance: f32,
    pub second_retract_speed: f32,
    pub light_pwm: u16,
}

impl Default for GooLayer {
    fn default() -> Self {
        Self {
            pause_flag: 0,
            pause_position_z: 0.0,
            layer_position_z: 0.0,
            layer_exposure_time: 8.0,
            layer_off_time: 1.0,
            before_lift_time: 0.0,
            after_lift_time: 0.0,
            after_retract_time: 0.0,
            lift_distance: 5.0,
            lift_speed: 100.0,
            second_lift_distance: 0.0,
            second_lift_speed: 0.0,
            retract_distance: 5.0,
            retract_speed: 100.0,
            second_retract_distance: 0.0,
            second_retract_speed: 0.0,
            light_pwm: 255,
        }
    }
}

impl GooLayer {
    pub(super) fn write(&self, w: &mut GooWriter) {
        w.write_u16(self.pause_flag);
        w.write_f32(self.pause_position_z);
        w.write_f32(self.layer_position_z);
        w.write_f32(self.layer_exposure_time);
        w.write_f32(self.layer_off_time);
        w.write_f32(self.before_lift_time);
        w.write_f32(self.after_lift_time);
        w.write_f32(self.after_retract_time);
        w.write_f32(self.lift_distance);
        w.write_f32(self.lift_speed);
        w.write_f32(self.second_lift_distance);
        w.write_f32(self.second_lift_speed);
        w.write_f32(self.retract_distance);
        w.write_f32(self.retract_speed);
        w.write_f32(self.second_retract_distance);
        w.write_f32(self.second_retract_speed);
        w.write_u16(self.light_pwm);
        w.write_delimiter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goo::writer::GooWriter;

    // 4 version + 8 magic + 32 + 24 + 24 + 32 + 32 + 32 strings
    // + 3 * 2 levels + previews + delimiters + numeric block.
    const HEADER_LEN: usize = 4
        + 8
        + 32
        + 24
        + 24
        + 32
        + 32
        + 32
        + 6
        + 2 * SMALL_PREVIEW_DIM * SMALL_PREVIEW_DIM
        + 2
        + 2 * BIG_PREVIEW_DIM * BIG_PREVIEW_DIM
        + 2
        + 4
        + 2 * 2
        + 2
        + 4 * 5
        + 1
        + 4 * 7
        + 4
        + 4
        + 4 * 16
        + 2 * 2
        + 1
        + 4
        + 4 * 3
        + 8
        + 4
        + 1
        + 2;

    #[test]
    fn header_layout_is_fixed_width() {
        let mut w = GooWriter::new();
        let token = GooHeader::default().write(&mut w);
        assert_eq!(w.position(), HEADER_LEN);
        w.patch_u32(token, 0).unwrap();
        let bytes = w.finalize().unwrap();
        assert_eq!(&bytes[..4], b"1.0\0");
        assert_eq!(&bytes[4..12], &MAGIC_TAG);
    }

    #[test]
    fn layer_record_is_66_bytes() {
        let mut w = GooWriter::new();
        GooLayer::default().write(&mut w);
        let bytes = w.finalize().unwrap();
        assert_eq!(bytes.len(), 2 + 15 * 4 + 2 + 2);
        assert_eq!(&bytes[bytes.len() - 2..], &[0x0D, 0x0A]);
    }

    #[test]
    fn preview_slot_zeroed_when_absent() {
        let mut w = GooWriter::new();
        let token = GooHeader::default().write(&mut w);
        w.patch_u32(token, 0).unwrap();
        let bytes = w.finalize().unwrap();
        let preview_start = 4 + 8 + 32 + 24 + 24 + 32 + 32 + 32 + 6;
        let slot = &bytes[preview_start..preview_start + 2 * SMALL_PREVIEW_DIM * SMALL_PREVIEW_DIM];
        assert!(slot.iter().all(|&b| b == 0));
    }
}

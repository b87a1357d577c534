//! Run-length codec for grayscale layer images.
//!
//! The stream opens with the magic byte `0x55` and closes with a one-byte
//! checksum (sum of every payload byte between magic and checksum, mod
//! 256). Each run starts with a control byte whose top two bits pick the
//! color class:
//!
//! * `00` background (value 0)
//! * `01` explicit gray, value byte follows the length bytes
//! * `10` delta against the previous run's value
//! * `11` foreground (value 255)
//!
//! For the absolute classes, bits 5..4 select how many extra length bytes
//! follow the 4-bit inline count, low nibble first. The delta class
//! reuses bit 5 as the sign and bit 4 to flag a one-byte run count.

use crate::{Error, Result};

/// First byte of every encoded image.
pub const RLE_MAGIC: u8 = 0x55;

const CLASS_BACKGROUND: u8 = 0b0000_0000;
const CLASS_GRAY: u8 = 0b0100_0000;
const CLASS_DELTA: u8 = 0b1000_0000;
const CLASS_FOREGROUND: u8 = 0b1100_0000;

const DELTA_SIGN_NEGATIVE: u8 = 0x20;
const DELTA_HAS_COUNT: u8 = 0x10;

const MAX_RUN: usize = 0x0FFF_FFFF;

/// Encode a grayscale pixel buffer into the run-length stream.
pub fn encode_rle(pixels: &[u8]) -> Result<Vec<u8>> {
    let mut out = vec![RLE_MAGIC];
    let mut prev: u8 = 0;
    let mut first_run = true;

    let mut i = 0;
    while i < pixels.len() {
        let value = pixels[i];
        let mut count = 1;
        while i + count < pixels.len() && pixels[i + count] == value {
            count += 1;
        }
        i += count;

        match value {
            0 => push_run(&mut out, CLASS_BACKGROUND, count)?,
            255 => push_run(&mut out, CLASS_FOREGROUND, count)?,
            _ => {
                let delta = i16::from(value) - i16::from(prev);
                if !first_run && delta != 0 && delta.unsigned_abs() <= 15 && count <= 255 {
                    let mut control = CLASS_DELTA | delta.unsigned_abs() as u8;
                    if delta < 0 {
                        control |= DELTA_SIGN_NEGATIVE;
                    }
                    if count > 1 {
                        control |= DELTA_HAS_COUNT;
                        out.push(control);
                        out.push(count as u8);
                    } else {
                        out.push(control);
                    }
                } else {
                    push_run(&mut out, CLASS_GRAY, count)?;
                    out.push(value);
                }
            }
        }
        prev = value;
        first_run = false;
    }

    let checksum = out[1..].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    out.push(checksum);
    Ok(out)
}

/// Emit a control byte plus escalation length bytes, low nibble first.
fn push_run(out: &mut Vec<u8>, class: u8, count: usize) -> Result<()> {
    if count > MAX_RUN {
        return Err(Error::Encoding(format!(
            "run of {count} pixels exceeds the 28-bit length limit"
        )));
    }
    let inline = (count & 0x0F) as u8;
    if count <= 0x0F {
        out.push(class | inline);
    } else if count <= 0x0FFF {
        out.push(class | 0x10 | inline);
        out.push((count >> 4) as u8);
    } else if count <= 0x000F_FFFF {
        out.push(class | 0x20 | inline);
        out.push((count >> 4) as u8);
        out.push((count >> 12) as u8);
    } else {
        out.push(class | 0x30 | inline);
        out.push((count >> 4) as u8);
        out.push((count >> 12) as u8);
        out.push((count >> 20) as u8);
    }
    Ok(())
}

/// Decode a run-length stream back into `pixel_count` grayscale pixels.
///
/// Validates the magic byte, the checksum, and that the runs cover the
/// pixel buffer exactly.
pub fn decode_rle(data: &[u8], pixel_count: usize) -> Result<Vec<u8>> {
    if data.first() != Some(&RLE_MAGIC) {
        return Err(Error::Encoding("missing RLE magic byte".into()));
    }
    let mut out = Vec::with_capacity(pixel_count);
    let mut prev: u8 = 0;
    let mut pos = 1;

    let next = |pos: &mut usize| -> Result<u8> {
        // The final byte is the checksum, never run data.
        if *pos + 1 >= data.len() {
            return Err(Error::Encoding("truncated RLE stream".into()));
        }
        let b = data[*pos];
        *pos += 1;
        Ok(b)
    };

    while out.len() < pixel_count {
        let control = next(&mut pos)?;
        let (value, count) = if control & 0xC0 == CLASS_DELTA {
            let magnitude = i16::from(control & 0x0F);
            let delta = if control & DELTA_SIGN_NEGATIVE != 0 {
                -magnitude
            } else {
                magnitude
            };
            let count = if control & DELTA_HAS_COUNT != 0 {
                usize::from(next(&mut pos)?)
            } else {
                1
            };
            let value = i16::from(prev) + delta;
            let value = u8::try_from(value).map_err(|_| {
                Error::Encoding(format!("delta run escapes byte range ({value})"))
            })?;
            (value, count)
        } else {
            let mut count = usize::from(control & 0x0F);
            let extra = usize::from((control >> 4) & 0x03);
            for byte in 0..extra {
                count |= usize::from(next(&mut pos)?) << (4 + 8 * byte);
            }
            let value = match control & 0xC0 {
                CLASS_BACKGROUND => 0,
                CLASS_FOREGROUND => 255,
                _ => next(&mut pos)?,
            };
            (value, count)
        };

        if out.len() + count > pixel_count {
            return Err(Error::Encoding(format!(
                "run of {count} pixels overruns the {pixel_count}-pixel image"
            )));
        }
        out.resize(out.len() + count, value);
        prev = value;
    }

    if pos + 1 != data.len() {
        return Err(Error::Encoding("trailing bytes after final run".into()));
    }
    let expected = data[1..pos].iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    if data[pos] != expected {
        return Err(Error::Encoding(format!(
            "checksum mismatch: stored {:#04x}, computed {expected:#04x}",
            data[pos]
        )));
    }
    Ok(out)
}

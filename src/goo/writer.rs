//! Primitive byte emitters for the GOO container.
//!
//! All multi-byte integers and floats are little-endian, matching the
//! reference encoder. Forward references use an explicit two-phase
//! protocol: [`GooWriter::reserve_u32`] hands out a [`PatchToken`] that
//! must be patched exactly once before [`GooWriter::finalize`].

use crate::{Error, Result};

/// Handle for a reserved 32-bit slot awaiting its final value.
#[derive(Debug)]
#[must_use = "a reserved slot must be patched before finalize"]
pub struct PatchToken {
    index: usize,
}

#[derive(Debug, Clone, Copy)]
struct Reservation {
    position: usize,
    patched: bool,
}

/// Buffered binary writer with a running cursor.
#[derive(Debug, Default)]
pub struct GooWriter {
    buf: Vec<u8>,
    reservations: Vec<Reservation>,
}

impl GooWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte offset from the start of the document.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a string into a fixed-width field, padded with zero bytes and
    /// truncated when too long.
    pub fn write_str(&mut self, s: &str, width: usize) {
        let bytes = s.as_bytes();
        let take = bytes.len().min(width);
        self.buf.extend_from_slice(&bytes[..take]);
        self.buf.resize(self.buf.len() + (width - take), 0);
    }

    /// The two-byte record delimiter `0D 0A`.
    pub fn write_delimiter(&mut self) {
        self.buf.extend_from_slice(&[0x0D, 0x0A]);
    }

    /// Reserve a 32-bit slot whose value is not yet known.
    pub fn reserve_u32(&mut self) -> PatchToken {
        let position = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        self.reservations.push(Reservation {
            position,
            patched: false,
        });
        PatchToken {
            index: self.reservations.len() - 1,
        }
    }

    /// Fill a reserved slot. Each token may be patched exactly once.
    pub fn patch_u32(&mut self, token: PatchToken, value: u32) -> Result<()> {
        let reservation = self
            .reservations
            .get_mut(token.index)
            .ok_or_else(|| Error::OffsetPatch(format!("unknown patch token {}", token.index)))?;
        if reservation.patched {
            return Err(Error::OffsetPatch(format!(
                "slot at byte {} patched twice",
                reservation.position
            )));
        }
        self.buf[reservation.position..reservation.position + 4]
            .copy_from_slice(&value.to_le_bytes());
        reservation.patched = true;
        Ok(())
    }

    /// Consume the writer, yielding the finished byte buffer.
    ///
    /// Fails when any reserved slot was never patched: emitting a
    /// placeholder offset to disk would produce a file the printer
    /// cannot seek.
    pub fn finalize(self) -> Result<Vec<u8>> {
        if let Some(r) = self.reservations.iter().find(|r| !r.patched) {
            return Err(Error::OffsetPatch(format!(
                "reserved slot at byte {} was never patched",
                r.position
            )));
        }
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut w = GooWriter::new();
        w.write_u16(0x1234);
        w.write_u32(0xAABBCCDD);
        let buf = w.finalize().unwrap();
        assert_eq!(buf, vec![0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn strings_pad_and_truncate() {
        let mut w = GooWriter::new();
        w.write_str("ab", 4);
        w.write_str("overflow", 4);
        let buf = w.finalize().unwrap();
        assert_eq!(&buf[..4], b"ab\0\0");
        assert_eq!(&buf[4..], b"over");
    }

    #[test]
    fn reserve_then_patch() {
        let mut w = GooWriter::new();
        w.write_u8(0xFF);
        let token = w.reserve_u32();
        w.write_u8(0xEE);
        w.patch_u32(token, 0x01020304).unwrap();
        let buf = w.finalize().unwrap();
        assert_eq!(buf, vec![0xFF, 0x04, 0x03, 0x02, 0x01, 0xEE]);
    }

    #[test]
    fn finalize_rejects_unpatched_slot() {
        let mut w = GooWriter::new();
        let _token = w.reserve_u32();
        assert!(matches!(w.finalize(), Err(Error::OffsetPatch(_))));
    }

    #[test]
    fn double_patch_rejected() {
        let mut w = GooWriter::new();
        let token = w.reserve_u32();
        w.patch_u32(token, 1).unwrap();
        let fake = PatchToken { index: 0 };
        assert!(w.patch_u32(fake, 2).is_err());
    }

    #[test]
    fn f32_layout() {
        let mut w = GooWriter::new();
        w.write_f32(1.0);
        assert_eq!(w.finalize().unwrap(), 1.0f32.to_le_bytes().to_vec());
    }
}

//! GOO job-file container: header, per-layer records, RLE image
//! payloads, and the fixed trailer.
//!
//! The document is assembled in memory and published to disk in one
//! atomic rename, so an interrupted export never leaves a partial file
//! at the target path.

mod header;
mod rle;
mod writer;

pub use header::{GooHeader, GooLayer, BIG_PREVIEW_DIM, ENDING_STRING, MAGIC_TAG, SMALL_PREVIEW_DIM};
pub use rle::{decode_rle, encode_rle, RLE_MAGIC};
pub use writer::{GooWriter, PatchToken};

use std::fs;
use std::path::Path;

use log::debug;

use crate::raster::RasterFrame;
use crate::Result;

struct EncodedLayer {
    definition: GooLayer,
    image: Vec<u8>,
}

/// An in-memory GOO file under construction.
pub struct GooDocument {
    header: GooHeader,
    layers: Vec<EncodedLayer>,
}

impl GooDocument {
    pub fn new(header: GooHeader) -> Self {
        Self {
            header,
            layers: Vec::new(),
        }
    }

    pub fn header(&self) -> &GooHeader {
        &self.header
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Encode a raster frame and append it with its layer record.
    pub fn add_layer(&mut self, definition: GooLayer, frame: &RasterFrame) -> Result<()> {
        let image = encode_rle(frame.pixels())?;
        self.add_encoded_layer(definition, image);
        Ok(())
    }

    /// Append a layer whose image was encoded elsewhere, e.g. on a
    /// worker thread. Layers must arrive in bottom-up order.
    pub fn add_encoded_layer(&mut self, definition: GooLayer, image: Vec<u8>) {
        self.layers.push(EncodedLayer { definition, image });
    }

    /// Serialize the complete file.
    ///
    /// The header's layer-content offset is reserved up front and
    /// patched once the header's true extent is known; `total_layers`
    /// is overridden with the actual layer count.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = self.header.clone();
        header.total_layers = self.layers.len() as u32;

        let mut w = GooWriter::new();
        let offset_token = header.write(&mut w);
        let content_offset = w.position() as u32;

        for layer in &self.layers {
            layer.definition.write(&mut w);
            w.write_u32(layer.image.len() as u32);
            w.write_bytes(&layer.image);
            w.write_delimiter();
        }
        w.write_bytes(&ENDING_STRING);

        w.patch_u32(offset_token, content_offset)?;
        w.finalize()
    }

    /// Serialize and publish atomically: the bytes land in a sibling
    /// temp file that is renamed over the target only when complete.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("goo.part");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

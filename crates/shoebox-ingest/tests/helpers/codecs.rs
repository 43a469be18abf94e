//! Codecs injected into the dispatcher by tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use shoebox_processing::codec::RasterCodec;
use shoebox_processing::{Codec, DecodeError};

/// Raster codec that counts how often it decodes.
#[derive(Clone, Default)]
pub struct CountingCodec {
    pub decodes: Arc<AtomicUsize>,
}

impl CountingCodec {
    pub fn count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl Codec for CountingCodec {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn matches_signature(&self, _data: &[u8]) -> bool {
        true
    }

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        RasterCodec.decode(data)
    }
}

/// Stands in for libheif: reads a PNG stored after a leading `ftyp` box.
pub struct BoxedPngCodec;

impl Codec for BoxedPngCodec {
    fn name(&self) -> &'static str {
        "boxed-png"
    }

    fn matches_signature(&self, data: &[u8]) -> bool {
        data.get(4..8) == Some(&b"ftyp"[..])
    }

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        let size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        RasterCodec.decode(data.get(size..).ok_or(DecodeError::Truncated)?)
    }
}

use image::RgbaImage;

use super::{ensure_dimensions, Codec, DecodeError};

/// JPEG, PNG, GIF, BMP and anything else the `image` crate recognises from
/// its magic bytes. Higher bit depths are reduced to 8 bits per channel and
/// grayscale or palette images expanded to RGBA.
#[derive(Debug, Default)]
pub struct RasterCodec;

impl Codec for RasterCodec {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn matches_signature(&self, _data: &[u8]) -> bool {
        true
    }

    fn decode(&self, data: &[u8]) -> Result<RgbaImage, DecodeError> {
        let img = image::load_from_memory(data)
            .map_err(|e| DecodeError::from_image(self.name(), e))?;
        ensure_dimensions(img.into_rgba8())
    }
}
